pub mod dropbox_client;
pub mod flow_client;

pub use dropbox_client::{DropboxClient, DropboxEntry, FolderListing};
pub use flow_client::{FlowClient, FlowTransport};
