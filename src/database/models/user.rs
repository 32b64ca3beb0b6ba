use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::database::entity::{Column, Entity, SqlType};
use crate::database::json_fields::JsonEntity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Option<Uuid>,
    pub username: String,
    pub email: String,
}

impl User {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: None,
            username: username.into(),
            email: email.into(),
        }
    }
}

impl Entity for User {
    type Id = Uuid;

    const TABLE: &'static str = "users";
    const COLUMNS: &'static [Column] = &[
        Column::id("id", SqlType::Uuid),
        Column::required("username", SqlType::Varchar),
        Column::required("email", SqlType::Varchar),
    ];

    fn id(&self) -> Option<Uuid> {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = Some(id);
    }
}

// No JSON columns: a JSON-queryable user repository answers every query empty
impl JsonEntity for User {}
