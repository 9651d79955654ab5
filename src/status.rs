//! Role and lifecycle enums shared by entities, DTOs and services.
//!
//! Every status column is stored as text; the transition rules live here so that
//! handlers and the payment reconciliation path apply the same table.

use std::fmt;

use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::error::AppError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Cannot change {entity} status from {from} to {to}")]
    NotAllowed {
        entity: &'static str,
        from: String,
        to: String,
    },
    #[error("Cannot complete a booking before its booking date ({booking_date})")]
    BeforeBookingDate { booking_date: NaiveDate },
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[sea_orm(string_value = "guest")]
    Guest,
    #[sea_orm(string_value = "customer")]
    Customer,
    #[sea_orm(string_value = "staff")]
    Staff,
    #[sea_orm(string_value = "manager")]
    Manager,
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "shop")]
    Shop,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::Customer => "customer",
            Role::Staff => "staff",
            Role::Manager => "manager",
            Role::Admin => "admin",
            Role::Shop => "shop",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "deliverying")]
    Deliverying,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Deliverying => "deliverying",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Statuses directly reachable from `self`. No implicit skips.
    pub fn next_states(&self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Processing, Cancelled],
            Processing => &[Accepted, Cancelled],
            Accepted => &[Deliverying, Cancelled],
            Deliverying => &[Completed, Cancelled],
            Completed | Cancelled => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.next_states().is_empty()
    }

    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        self.next_states().contains(&target)
    }

    pub fn transition(self, target: OrderStatus) -> Result<OrderStatus, TransitionError> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(TransitionError::NotAllowed {
                entity: "order",
                from: self.to_string(),
                to: target.to_string(),
            })
        }
    }

    /// Orders whose amount counts as revenue on the dashboard.
    pub fn revenue_states() -> [OrderStatus; 4] {
        [
            OrderStatus::Processing,
            OrderStatus::Accepted,
            OrderStatus::Deliverying,
            OrderStatus::Completed,
        ]
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "failed")]
    Failed,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "cod")]
    Cod,
    #[sea_orm(string_value = "payos")]
    Payos,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn next_states(&self) -> &'static [BookingStatus] {
        use BookingStatus::*;
        match self {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[Completed, Cancelled],
            Completed | Cancelled => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.next_states().is_empty()
    }

    /// Validates a booking transition. Completion is only possible on or after the
    /// booking date, compared as calendar days.
    pub fn transition(
        self,
        target: BookingStatus,
        today: NaiveDate,
        booking_date: NaiveDate,
    ) -> Result<BookingStatus, TransitionError> {
        if !self.next_states().contains(&target) {
            return Err(TransitionError::NotAllowed {
                entity: "booking",
                from: self.to_string(),
                to: target.to_string(),
            });
        }
        if target == BookingStatus::Completed && today < booking_date {
            return Err(TransitionError::BeforeBookingDate { booking_date });
        }
        Ok(target)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum BookingPaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "failed")]
    Failed,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// Operating standing of a shop, derived from its approval decision, the admin
/// activity switch and the subscription package flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ShopStanding {
    PendingReview,
    Rejected,
    /// Approved but switched off by an admin.
    Suspended,
    /// Approved and active, subscription not paid yet.
    AwaitingPackage,
    Operational,
}

impl ShopStanding {
    pub fn derive(approval: ApprovalStatus, is_active: bool, has_active_package: bool) -> Self {
        match (approval, is_active, has_active_package) {
            (ApprovalStatus::Pending, _, _) => ShopStanding::PendingReview,
            (ApprovalStatus::Rejected, _, _) => ShopStanding::Rejected,
            (ApprovalStatus::Approved, false, _) => ShopStanding::Suspended,
            (ApprovalStatus::Approved, true, false) => ShopStanding::AwaitingPackage,
            (ApprovalStatus::Approved, true, true) => ShopStanding::Operational,
        }
    }

    /// Shops may list products only with an approved, active account and a paid package.
    pub fn can_list_products(&self) -> bool {
        matches!(self, ShopStanding::Operational)
    }

    pub fn can_offer_services(&self) -> bool {
        matches!(self, ShopStanding::Operational | ShopStanding::AwaitingPackage)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityType {
    #[sea_orm(string_value = "in_stock")]
    InStock,
    #[sea_orm(string_value = "pre_order")]
    PreOrder,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum ComboType {
    #[sea_orm(string_value = "basic")]
    Basic,
    #[sea_orm(string_value = "premium")]
    Premium,
    #[sea_orm(string_value = "family")]
    Family,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    #[sea_orm(string_value = "onsite")]
    Onsite,
    #[sea_orm(string_value = "offsite")]
    Offsite,
    #[sea_orm(string_value = "both")]
    Both,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Onsite => "onsite",
            ServiceType::Offsite => "offsite",
            ServiceType::Both => "both",
        }
    }

    /// A booking is made for one concrete location type.
    pub fn accepts(&self, requested: ServiceType) -> bool {
        match self {
            ServiceType::Both => requested != ServiceType::Both,
            other => *other == requested,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum ServiceAvailability {
    #[sea_orm(string_value = "available")]
    Available,
    #[sea_orm(string_value = "unavailable")]
    Unavailable,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum PaymentPurpose {
    #[sea_orm(string_value = "order")]
    Order,
    #[sea_orm(string_value = "booking")]
    Booking,
    #[sea_orm(string_value = "shop_package")]
    ShopPackage,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum PaymentLinkStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "failed")]
    Failed,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum ConsultationType {
    /// Call back as soon as possible.
    #[sea_orm(string_value = "call_now")]
    CallNow,
    #[sea_orm(string_value = "schedule")]
    Schedule,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum ConsultationStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    #[sea_orm(string_value = "pending_reschedule")]
    PendingReschedule,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl ConsultationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationStatus::Pending => "pending",
            ConsultationStatus::Scheduled => "scheduled",
            ConsultationStatus::PendingReschedule => "pending_reschedule",
            ConsultationStatus::Completed => "completed",
            ConsultationStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(ConsultationStatus::Pending),
            "scheduled" => Some(ConsultationStatus::Scheduled),
            "pending_reschedule" => Some(ConsultationStatus::PendingReschedule),
            "completed" => Some(ConsultationStatus::Completed),
            "cancelled" => Some(ConsultationStatus::Cancelled),
            _ => None,
        }
    }

    /// Where a new request starts: call-now requests wait in the queue, scheduled
    /// ones already have a slot.
    pub fn initial(kind: ConsultationType) -> Self {
        match kind {
            ConsultationType::CallNow => ConsultationStatus::Pending,
            ConsultationType::Schedule => ConsultationStatus::Scheduled,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, ConsultationStatus::Completed | ConsultationStatus::Cancelled)
    }

    /// Status after a call with `result` was logged. A missed call leaves the
    /// request where it was so it can be retried.
    pub fn after_call(self, result: CallResult) -> Self {
        match result {
            CallResult::Success => ConsultationStatus::Completed,
            CallResult::Rescheduled => ConsultationStatus::PendingReschedule,
            CallResult::Rejected => ConsultationStatus::Cancelled,
            CallResult::NoAnswer => self,
        }
    }
}

impl fmt::Display for ConsultationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum CallResult {
    #[sea_orm(string_value = "success")]
    Success,
    #[sea_orm(string_value = "rescheduled")]
    Rescheduled,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "no_answer")]
    NoAnswer,
}
