pub mod booking;
pub mod identity;
pub mod repository;
pub mod seats;
pub mod trip;
pub mod validation;

pub use booking::{BookingChange, BookingEvent, BookingRecord, BookingStatus};
pub use identity::{
    AuthUser, MockTokenVerifier, NameCandidates, TokenVerifier, VerifyError, DEFAULT_DISPLAY_NAME,
};
pub use repository::{
    PageRequest, TokenStoreError, TripFilter, TripPage, TripRepository, TripStoreError,
    UserTokenRepository,
};
pub use seats::{SeatError, SeatState, SeatUpdate};
pub use trip::{DriverRef, Trip, TripDraft, TripPatch};
pub use validation::{FieldIssue, ValidationErrors};
