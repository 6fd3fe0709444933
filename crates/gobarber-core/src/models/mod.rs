//! Data models exchanged with the GoBarber backend.
//!
//! - `Identity`: the authenticated user's profile
//! - `Appointment`, `MonthAvailabilityItem`: provider schedule data
//! - Request/response bodies for sessions, sign-up, password recovery and
//!   profile updates

pub mod appointment;
pub mod identity;
pub mod requests;

pub use appointment::{Appointment, AppointmentClient, MonthAvailabilityItem};
pub use identity::Identity;
pub use requests::{
    ForgotPasswordRequest, ProfileUpdate, SessionResponse, SignInRequest, SignUpRequest,
};
