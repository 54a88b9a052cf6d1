use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Enrollment {
    pub id: i32,
    pub course_id: i32,
    pub user_id: i32,
    pub enrolled_at: NaiveDateTime,
}
