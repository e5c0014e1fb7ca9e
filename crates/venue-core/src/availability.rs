//! # Availability
//!
//! Occupancy is derived on read: the active holders of a category are the
//! resource ids referenced by records in {available, running}, and the
//! available set is every instance of the category minus those holders.
//!
//! ```text
//!   instances(category)        {R1, R2, R3, R4}
//!   active_holders(category)   {R2, R4}
//!   ─────────────────────────────────────────
//!   available_set(category)    {R1, R3}
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::{Resource, ResourceCategory};

/// Whether an instance is currently held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Occupancy {
    Occupied,
    Available,
}

/// Instances of `category` not held by an active record, in input order.
pub fn available_set<'a>(
    category: ResourceCategory,
    instances: &'a [Resource],
    holders: &HashSet<String>,
) -> Vec<&'a Resource> {
    instances
        .iter()
        .filter(|r| r.category == category && !holders.contains(&r.id))
        .collect()
}

/// Occupancy of one instance.
pub fn occupancy(resource: &Resource, holders: &HashSet<String>) -> Occupancy {
    if holders.contains(&resource.id) {
        Occupancy::Occupied
    } else {
        Occupancy::Available
    }
}

/// Checks that `resource` belongs to `category` and is not held.
pub fn ensure_bookable(
    category: ResourceCategory,
    resource: &Resource,
    holders: &HashSet<String>,
) -> CoreResult<()> {
    if resource.category != category {
        return Err(CoreError::WrongResourceCategory {
            resource_id: resource.id.clone(),
            expected: category.to_string(),
        });
    }

    if holders.contains(&resource.id) {
        return Err(CoreError::ResourceOccupied {
            category: category.to_string(),
            resource_id: resource.id.clone(),
        });
    }

    Ok(())
}
