// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod property_descriptor;
mod property_details;
mod representation;

pub use property_descriptor::PropertyDescriptor;
pub use property_details::{
    PropertyAttributes, PropertyDetails, PropertyKind, PropertyLocation,
};
pub use representation::{FieldType, PropertyConstness, Representation};
