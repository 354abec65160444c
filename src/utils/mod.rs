pub mod extract;
pub mod filter;
pub mod jwt;
pub mod security;
pub mod slug;
pub mod validation;
