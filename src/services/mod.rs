mod auth;
mod pocket;

pub use auth::{AuthError, Authorizer, Credentials};
pub use pocket::{
    ClientSettings, FetchError, ItemState, PocketClient, RawList, RetrieveApi, RetrieveQuery,
    RetrieveResponse, POCKET_API_URL,
};
