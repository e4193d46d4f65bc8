// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::ecmascript::{
    execution::{Agent, JsResult, PolicyReason},
    types::{InternalSlots, Object, Value},
};

/// Native function body: `(agent, this, arguments)`.
pub type Behaviour = fn(&mut Agent, Value, &[Value]) -> JsResult<Value>;

/// ### [7.3.14 Call ( F, V \[ , argumentsList \] )](https://tc39.es/ecma262/#sec-call)
pub fn call_function(
    agent: &mut Agent,
    function: Object,
    this_argument: Value,
    arguments: &[Value],
) -> JsResult<Value> {
    match &function.record(agent).internal {
        InternalSlots::Function(behaviour) => {
            let behaviour = *behaviour;
            behaviour(agent, this_argument, arguments)
        }
        // Callable proxies forward calls to their target.
        InternalSlots::Proxy(data) if function.is_callable(agent) => match data.target {
            Some(target) => call_function(agent, target, this_argument, arguments),
            None => Err(agent.policy_failure(PolicyReason::ProxyRevoked, None)),
        },
        _ => Err(agent.policy_failure(PolicyReason::NotCallable, None)),
    }
}
