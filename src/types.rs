//! Domain types for the festival ticketing backend.
//!
//! Value objects, identifiers, and entities shared across the API surface,
//! the stores, and the ticket issuance core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing `Uuid`.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner `Uuid`.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Unique identifier for an artist.
    ArtistId
);
uuid_id!(
    /// Unique identifier for an event.
    EventId
);
uuid_id!(
    /// Unique identifier for a user.
    UserId
);
uuid_id!(
    /// Unique identifier for an API key.
    ApiKeyId
);
uuid_id!(
    /// Unique identifier for a ticket.
    TicketId
);

// ============================================================================
// Money value object (cents-based to avoid floating point errors)
// ============================================================================

/// Represents money in cents to avoid floating-point arithmetic errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    /// Creates a `Money` value from cents.
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents.
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Multiplies the amount by a quantity with overflow checking.
    #[must_use]
    pub const fn checked_mul(&self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as u64) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Status enums
// ============================================================================

/// Lifecycle status of an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventStatus {
    /// Tickets can be purchased.
    Available,
    /// All capacity has been sold; purchases are rejected.
    SoldOut,
    /// The event was cancelled; purchases are rejected.
    Cancelled,
    /// The event was postponed to a later date.
    Postponed,
}

/// Lifecycle status of a ticket.
///
/// Only `Cancelled` frees inventory: cancelled tickets do not count toward
/// an event's sold total.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketStatus {
    /// Created by a purchase, awaiting payment.
    Reserved,
    /// Payment completed.
    Paid,
    /// Cancelled; the quantity is returned to the event's inventory.
    Cancelled,
    /// Redeemed at the venue.
    Used,
}

/// Role of a registered user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    /// Ticket buyer.
    Customer,
    /// Platform administrator.
    Admin,
    /// Event organizer.
    Organizer,
}

/// Lifecycle status of an API key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiKeyStatus {
    /// Usable for authentication.
    Active,
    /// Temporarily disabled.
    Inactive,
    /// Past its expiry timestamp.
    Expired,
    /// Explicitly revoked; never usable again.
    Revoked,
}

// ============================================================================
// Entities
// ============================================================================

/// A performing artist.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Artist {
    /// Identifier.
    pub id: ArtistId,
    /// Artist or band name.
    pub name: String,
    /// Musical genre.
    pub genre: String,
    /// Free-form biography.
    pub biography: Option<String>,
}

/// A festival event with bounded ticket capacity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    /// Identifier.
    pub id: EventId,
    /// Event name.
    pub name: String,
    /// Event description.
    pub description: Option<String>,
    /// Date the event takes place.
    pub date: DateTime<Utc>,
    /// Venue name.
    pub venue: String,
    /// Maximum number of tickets that can be sold.
    pub capacity_maximum: u32,
    /// Price per ticket.
    pub ticket_price: Money,
    /// Lifecycle status.
    pub status: EventStatus,
    /// Artists performing at this event.
    pub artist_ids: Vec<ArtistId>,
}

impl Event {
    /// True when purchases must be rejected based on status alone.
    #[must_use]
    pub fn is_closed_for_sales(&self) -> bool {
        matches!(self.status, EventStatus::SoldOut | EventStatus::Cancelled)
    }
}

/// A registered user.
///
/// The password is stored as a salted digest; the clear text never leaves
/// the login/registration handlers.
#[derive(Clone, Debug)]
pub struct User {
    /// Identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Unique email address.
    pub email: String,
    /// Salted password digest.
    pub password_hash: String,
    /// Role.
    pub role: UserRole,
}

/// An API key granting access to the authenticated surface.
#[derive(Clone, Debug)]
pub struct ApiKey {
    /// Identifier.
    pub id: ApiKeyId,
    /// The opaque key material presented in the `X-API-Key` header.
    pub key: String,
    /// Owning user.
    pub user_id: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Expiry timestamp.
    pub expires_at: DateTime<Utc>,
    /// Lifecycle status.
    pub status: ApiKeyStatus,
}

impl ApiKey {
    /// True when the key is past its expiry timestamp.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// A ticket created by the issuance core.
///
/// Quantity is fixed at creation; cancellation is the only transition that
/// frees inventory.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ticket {
    /// Identifier.
    pub id: TicketId,
    /// Buyer name.
    pub buyer_name: String,
    /// Buyer email.
    pub buyer_email: String,
    /// Number of admissions this ticket covers.
    pub quantity: u32,
    /// Total price paid (`quantity` × event unit price at purchase time).
    pub total_price: Money,
    /// Purchase timestamp.
    pub purchased_at: DateTime<Utc>,
    /// Lifecycle status.
    pub status: TicketStatus,
    /// Owning event.
    pub event_id: EventId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_display_formats_cents() {
        assert_eq!(Money::from_cents(12550).to_string(), "125.50");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
    }

    #[test]
    fn money_checked_mul() {
        let price = Money::from_cents(2500);
        assert_eq!(price.checked_mul(4), Some(Money::from_cents(10_000)));
        assert_eq!(Money::from_cents(u64::MAX).checked_mul(2), None);
    }

    #[test]
    fn event_closed_for_sales() {
        let mut event = Event {
            id: EventId::new(),
            name: "Summer Fest".to_string(),
            description: None,
            date: Utc::now(),
            venue: "Main Park".to_string(),
            capacity_maximum: 100,
            ticket_price: Money::from_cents(5000),
            status: EventStatus::Available,
            artist_ids: vec![],
        };
        assert!(!event.is_closed_for_sales());
        event.status = EventStatus::SoldOut;
        assert!(event.is_closed_for_sales());
        event.status = EventStatus::Postponed;
        assert!(!event.is_closed_for_sales());
    }
}
