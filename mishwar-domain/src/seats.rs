use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeatError {
    #[error("totalSeats cannot be less than the {booked} already booked seats")]
    InvalidSeatCount { requested: i32, booked: i32 },
    #[error("availableSeats cannot be negative")]
    NegativeSeatCount { requested: i32 },
    #[error("availableSeats cannot exceed the {max_available} unbooked seats")]
    SeatOverflow { requested: i32, max_available: i32 },
}

/// Seat counts as stored on a trip record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatState {
    pub total_seats: i32,
    pub available_seats: i32,
}

/// Requested seat changes; `None` means the caller left the field untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeatUpdate {
    pub total_seats: Option<i32>,
    pub available_seats: Option<i32>,
}

/// Reconcile a seat update against the current counts and the seats already
/// booked.
///
/// An explicitly requested `available_seats` above the unbooked capacity is
/// rejected; a carried-over stored value is clamped down instead, so
/// shrinking `total_seats` alone succeeds as long as the existing bookings
/// still fit.
pub fn reconcile(
    current: SeatState,
    booked_count: i32,
    update: SeatUpdate,
) -> Result<SeatState, SeatError> {
    // 1. Settle the total first: it bounds everything else.
    let total_seats = update.total_seats.unwrap_or(current.total_seats);
    if total_seats < booked_count {
        return Err(SeatError::InvalidSeatCount {
            requested: total_seats,
            booked: booked_count,
        });
    }
    let max_available = total_seats - booked_count;

    // 2. Settle availability, distinguishing an explicit request from the
    //    carried-over stored value.
    let requested = update.available_seats.unwrap_or(current.available_seats);
    if requested < 0 {
        return Err(SeatError::NegativeSeatCount { requested });
    }
    let available_seats = if requested > max_available {
        if update.available_seats.is_some() {
            return Err(SeatError::SeatOverflow {
                requested,
                max_available,
            });
        }
        max_available
    } else {
        requested
    };

    Ok(SeatState {
        total_seats,
        available_seats,
    })
}
