//! User accounts: credentials, bearer tokens, and the user record store.
//!
//! Provides:
//! - Password hashing with bcrypt (random salt per hash, cost 10)
//! - Stateless HS256 bearer tokens carrying the user id, valid for 2 hours
//! - A single JSON document holding every user record, rewritten on each mutation
//! - `AccountService`, which composes the three into signup/signin/profile operations
//!
//! ## Design Decisions
//! - Tokens are not stored server-side. Expiry is the only way a token stops working.
//! - The store serializes every read-modify-write behind one lock, including
//!   the signup uniqueness check and the file write.

pub mod error;
pub mod password;
pub mod service;
pub mod store;
pub mod token;

pub use error::{AccountError, StorageError, TokenError};
pub use password::PasswordHasher;
pub use service::{AccountService, ProfileUpdate, SigninRequest, SignupRequest, UserProfile};
pub use store::{UserChanges, UserDocument, UserRecord, UserStore};
pub use token::TokenService;
