//! Fixed page bodies required by the Zoom Marketplace listing.

pub const HOME: &str = "Welcome to the Unsplash Chatbot for Zoom!";

pub const SUPPORT: &str = "See Zoom Developer Support for help.";

pub const PRIVACY: &str = "The Unsplash Chatbot for Zoom does not store any user data.";

pub const TERMS: &str =
    "By installing the Unsplash Chatbot for Zoom, you accept and agree to these terms...";

pub const DOCUMENTATION: &str =
    "Try typing \"island\" to see a photo of an island, or anything else you have in mind!";

/// Body of the 401 returned to deauthorization calls with a bad verification token.
pub const UNAUTHORIZED: &str = "Unauthorized request to Unsplash Chatbot for Zoom.";
