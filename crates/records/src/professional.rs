//! Health professionals.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Record;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Professional {
    pub id: Uuid,
    pub name: String,
    pub specialty: String,
}

impl Record for Professional {
    const TABLE: &'static str = "professionals";
}
