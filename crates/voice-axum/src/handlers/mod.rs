pub mod admin;
pub mod browser_ws;
pub mod telephony_ws;
pub mod twiml;
