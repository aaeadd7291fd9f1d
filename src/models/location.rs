use crate::models::TreeNode;
use crate::schema::locations;

/// Location tree node (country, region, city)
#[derive(Debug, Serialize, Deserialize, Queryable, Identifiable, Clone, PartialEq)]
#[table_name = "locations"]
pub struct Location {
    pub id: i32,
    pub parent_id: Option<i32>,
    pub slug: String,
    pub name: String,
}

impl TreeNode for Location {
    fn node_id(&self) -> i32 {
        self.id
    }

    fn parent_id(&self) -> Option<i32> {
        self.parent_id
    }
}
