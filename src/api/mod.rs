//! Storefront request/response collaborators: catalog, wishlist and accounts.
//!
//! These endpoints sit outside the try-on loop; the loop only needs a
//! garment id from them.

mod client;
mod validation;

pub use client::{ApiError, ClothingItem, LoginSession, ShopClient, UserProfile, DEFAULT_TIMEOUT};
pub use validation::{
    is_valid_email, validate_password, validate_registration, RegistrationForm, MIN_PASSWORD_LEN,
};
