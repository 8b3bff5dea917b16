mod gray;
pub use gray::rgb_from_gray;
