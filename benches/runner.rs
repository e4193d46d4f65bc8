// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use shape_vm::{
    Agent, DefaultHostHooks, NoopHeapHooks, Object, Options, PropertyKey, ShouldThrow, Value,
    ecmascript::{
        abstract_operations::{get, set},
        builtins::ordinary::{
            FieldAccess, NormalizationMode,
            migration::{migrate_slow_to_fast, normalize_properties},
        },
        types::Name,
    },
};

const INSTANCES: usize = 256;
const PROPERTIES: usize = 16;

/// An agent with property names interned up front.
pub struct Scenario {
    agent: Agent,
    names: Vec<Name>,
}

impl Scenario {
    pub fn new() -> Self {
        let mut agent = Agent::new(Options::default(), &DefaultHostHooks, &NoopHeapHooks);
        let names = (0..PROPERTIES)
            .map(|i| Name::from_str(&mut agent, &format!("p{i}")))
            .collect();
        Self { agent, names }
    }

    fn store(&mut self, object: Object, name: Name, value: Value) {
        let stored = set(
            &mut self.agent,
            object,
            PropertyKey::Name(name),
            value,
            ShouldThrow::DontThrow,
        );
        assert_eq!(stored, Ok(true));
    }

    fn populated(&mut self) -> Object {
        let object = Object::new(&mut self.agent);
        for (i, name) in self.names.clone().into_iter().enumerate() {
            self.store(object, name, Value::Smi(i as i32));
        }
        object
    }

    /// Many instances following the same transition path.
    pub fn shared_transitions(mut self) {
        self.populated();
        let first_instance = self.agent.allocated_bytes();
        for _ in 1..INSTANCES {
            let before = self.agent.allocated_bytes();
            self.populated();
            assert!(self.agent.allocated_bytes() - before < first_instance);
        }
    }

    /// Every property is stored as a small integer and then as a double,
    /// deprecating each shape on the path once.
    pub fn field_generalization(mut self) {
        let objects: Vec<_> = (0..INSTANCES).map(|_| self.populated()).collect();
        for object in objects {
            for name in self.names.clone() {
                let value = Value::from_f64(&mut self.agent, 0.5);
                self.store(object, name, value);
            }
        }
    }

    pub fn property_loads(mut self) {
        let object = self.populated();
        for _ in 0..INSTANCES {
            for &name in &self.names {
                let value = get(&mut self.agent, object, PropertyKey::Name(name));
                assert!(value.is_ok());
            }
        }
    }

    pub fn cached_field_loads(mut self) {
        let object = self.populated();
        let handlers: Vec<_> = self
            .names
            .iter()
            .filter_map(|&name| FieldAccess::for_own_field(&self.agent, object, name))
            .collect();
        for _ in 0..INSTANCES {
            for handler in &handlers {
                assert!(handler.load(&mut self.agent, object).is_hit());
            }
        }
    }

    /// Round trips through dictionary mode.
    pub fn normalization(mut self) {
        let object = self.populated();
        for _ in 0..INSTANCES / 16 {
            normalize_properties(
                &mut self.agent,
                object,
                NormalizationMode::ClearInobjectProperties,
                0,
                "Benchmark",
            );
            migrate_slow_to_fast(&mut self.agent, object, 0, "Benchmark");
        }
    }
}
