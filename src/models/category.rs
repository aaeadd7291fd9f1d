//! EAV model categories
use crate::models::TreeNode;
use crate::schema::categories;

/// Category tree node, attributes of a category apply to all of its descendants
#[derive(Debug, Serialize, Deserialize, Queryable, Identifiable, Clone, PartialEq)]
#[table_name = "categories"]
pub struct Category {
    pub id: i32,
    pub parent_id: Option<i32>,
    pub slug: String,
    pub name: String,
}

impl TreeNode for Category {
    fn node_id(&self) -> i32 {
        self.id
    }

    fn parent_id(&self) -> Option<i32> {
        self.parent_id
    }
}
