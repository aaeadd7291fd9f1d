#[derive(Deserialize, Debug, Clone, Copy)]
pub struct Shards {
    pub total: u32,
    pub successful: u32,
    pub failed: u32,
}

#[derive(Deserialize, Debug)]
pub struct IndexResponse {
    #[serde(rename = "_shards")]
    pub shards: Shards,
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_version")]
    pub version: Option<u32>,
    pub result: String,
}

impl IndexResponse {
    pub fn is_created(&self) -> bool {
        self.result == "created"
    }
}
