//! Login, refresh, logout and OTP endpoints under `/api/auth`.

pub mod controller;
pub mod model;
pub mod otp;
pub mod router;
pub mod service;
pub mod token_info;
