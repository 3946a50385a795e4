use uuid::Uuid;

/// A fresh, collision-free rule id
pub fn generate_id() -> String {
    Uuid::new_v4().simple().to_string()
}
