use serde::{Deserialize, Serialize};

use crate::protocol::Timestamp;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(DownloadId);
id_newtype!(UploadId);

/// One row of the downloads table. `finished` is `None` while the transfer is
/// still running.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadRecord {
    pub id: DownloadId,
    pub path: String,
    #[serde(default)]
    pub local_size: Option<String>,
    #[serde(default, with = "crate::protocol::optional_timestamp")]
    pub finished: Option<Timestamp>,
}

/// One row of the uploaded torrents table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRecord {
    pub id: UploadId,
    pub name: String,
    #[serde(default, with = "crate::protocol::optional_timestamp")]
    pub sent: Option<Timestamp>,
}
