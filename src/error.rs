//! PFCP error handling.
//!
//! This module provides centralized error message templates (`messages`) and
//! the structured [`PfcpError`] type built on top of them. Every fallible
//! operation in this crate returns `Result<T, PfcpError>` (aliased as
//! [`PfcpResult`]) rather than a bare `std::io::Error`.
//!
//! ## Usage
//!
//! ```rust
//! use rs_pfcp::error::{PfcpError, messages};
//!
//! fn check(ie_name: &str, present: bool) -> Result<(), PfcpError> {
//!     if !present {
//!         return Err(PfcpError::InvalidFieldEncoding {
//!             field: ie_name.to_string(),
//!             reason: messages::missing_ie(ie_name),
//!         });
//!     }
//!     Ok(())
//! }
//! ```

/// Error message templates for consistent error reporting
pub mod messages {
    // ========================================================================
    // Missing IE Errors
    // ========================================================================

    /// Format: "Missing mandatory {ie_name} IE"
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_pfcp::error::messages;
    ///
    /// let error_msg = messages::missing_mandatory_ie_short("PDR ID");
    /// assert_eq!(error_msg, "Missing mandatory PDR ID IE");
    /// ```
    pub fn missing_mandatory_ie_short(ie_name: &str) -> String {
        format!("Missing mandatory {} IE", ie_name)
    }

    /// Format: "Missing {ie_name} IE"
    ///
    /// Used for both mandatory and conditional IEs where context makes it clear.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_pfcp::error::messages;
    ///
    /// let error_msg = messages::missing_ie("Node ID");
    /// assert_eq!(error_msg, "Missing Node ID IE");
    /// ```
    pub fn missing_ie(ie_name: &str) -> String {
        format!("Missing {} IE", ie_name)
    }

    /// Format: "{ie_name} IE not found"
    ///
    /// Alternative phrasing for IE lookup failures.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_pfcp::error::messages;
    ///
    /// let error_msg = messages::ie_not_found("F-SEID");
    /// assert_eq!(error_msg, "F-SEID IE not found");
    /// ```
    pub fn ie_not_found(ie_name: &str) -> String {
        format!("{} IE not found", ie_name)
    }

    /// Format: "{ie_name} is required"
    ///
    /// Used in builder validation and field checks.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_pfcp::error::messages;
    ///
    /// let error_msg = messages::ie_required("Cause");
    /// assert_eq!(error_msg, "Cause is required");
    /// ```
    pub fn ie_required(ie_name: &str) -> String {
        format!("{} is required", ie_name)
    }

    /// Format: "{ie_name} IE is mandatory"
    ///
    /// Explicit mandatory IE error for 3GPP compliance messages.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_pfcp::error::messages;
    ///
    /// let error_msg = messages::ie_is_mandatory("Cause");
    /// assert_eq!(error_msg, "Cause IE is mandatory");
    /// ```
    pub fn ie_is_mandatory(ie_name: &str) -> String {
        format!("{} IE is mandatory", ie_name)
    }

    // ========================================================================
    // Length Errors
    // ========================================================================

    /// Format: "{ie_name} requires at least {min_bytes} byte(s)"
    ///
    /// Used when IE payload is too short.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_pfcp::error::messages;
    ///
    /// let error_msg = messages::requires_at_least_bytes("PDR ID", 2);
    /// assert_eq!(error_msg, "PDR ID requires at least 2 bytes");
    /// ```
    pub fn requires_at_least_bytes(ie_name: &str, min_bytes: usize) -> String {
        let byte_word = if min_bytes == 1 { "byte" } else { "bytes" };
        format!("{} requires at least {} {}", ie_name, min_bytes, byte_word)
    }

    /// Format: "{ie_name} payload too short"
    ///
    /// Concise version for payload length errors.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_pfcp::error::messages;
    ///
    /// let error_msg = messages::payload_too_short("Reporting Triggers");
    /// assert_eq!(error_msg, "Reporting Triggers payload too short");
    /// ```
    pub fn payload_too_short(ie_name: &str) -> String {
        format!("{} payload too short", ie_name)
    }

    /// Format: "{ie_name} payload too short: expected at least {min_bytes} byte(s)"
    ///
    /// Detailed version with expected length.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_pfcp::error::messages;
    ///
    /// let error_msg = messages::payload_too_short_expected("Report Type", 1);
    /// assert_eq!(error_msg, "Report Type payload too short: expected at least 1 byte");
    /// ```
    pub fn payload_too_short_expected(ie_name: &str, min_bytes: usize) -> String {
        let byte_word = if min_bytes == 1 { "byte" } else { "bytes" };
        format!(
            "{} payload too short: expected at least {} {}",
            ie_name, min_bytes, byte_word
        )
    }

    /// Format: "{context} too short"
    ///
    /// Generic "too short" error for headers, payloads, or buffers.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_pfcp::error::messages;
    ///
    /// let error_msg = messages::too_short("Header");
    /// assert_eq!(error_msg, "Header too short");
    /// ```
    pub fn too_short(context: &str) -> String {
        format!("{} too short", context)
    }

    /// Format: "Invalid {ie_name} length: expected at least {expected} bytes, got {actual}"
    ///
    /// Precise length mismatch with both expected and actual values.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_pfcp::error::messages;
    ///
    /// let error_msg = messages::invalid_length("F-TEID", 9, 5);
    /// assert_eq!(error_msg, "Invalid F-TEID length: expected at least 9 bytes, got 5");
    /// ```
    pub fn invalid_length(ie_name: &str, expected: usize, actual: usize) -> String {
        format!(
            "Invalid {} length: expected at least {} bytes, got {}",
            ie_name, expected, actual
        )
    }

    // ========================================================================
    // Invalid Value Errors
    // ========================================================================

    /// Format: "Invalid {field_name} value"
    ///
    /// Generic invalid value error.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_pfcp::error::messages;
    ///
    /// let error_msg = messages::invalid_value("DSCP");
    /// assert_eq!(error_msg, "Invalid DSCP value");
    /// ```
    pub fn invalid_value(field_name: &str) -> String {
        format!("Invalid {} value", field_name)
    }

    /// Format: "Invalid {field_name} value: {reason}"
    ///
    /// Invalid value with explanation.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_pfcp::error::messages;
    ///
    /// let error_msg = messages::invalid_value_reason("gate status", "must be 0-3");
    /// assert_eq!(error_msg, "Invalid gate status value: must be 0-3");
    /// ```
    pub fn invalid_value_reason(field_name: &str, reason: &str) -> String {
        format!("Invalid {} value: {}", field_name, reason)
    }

    // ========================================================================
    // Builder Errors
    // ========================================================================

    /// Format: "{field_name} is required"
    ///
    /// Builder validation: missing required field.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_pfcp::error::messages;
    ///
    /// let error_msg = messages::builder_field_required("pdr_id");
    /// assert_eq!(error_msg, "pdr_id is required");
    /// ```
    pub fn builder_field_required(field_name: &str) -> String {
        format!("{} is required", field_name)
    }

    /// Format: "Builder {builder_type} is missing required field '{field_name}'"
    ///
    /// Detailed builder error with context.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_pfcp::error::messages;
    ///
    /// let error_msg = messages::builder_missing_field("CreatePdrBuilder", "pdr_id");
    /// assert_eq!(
    ///     error_msg,
    ///     "Builder CreatePdrBuilder is missing required field 'pdr_id'"
    /// );
    /// ```
    pub fn builder_missing_field(builder_type: &str, field_name: &str) -> String {
        format!(
            "Builder {} is missing required field '{}'",
            builder_type, field_name
        )
    }

    // ========================================================================
    // Security / Validation Errors
    // ========================================================================

    /// Format: "Zero-length IE not allowed for {ie_name} (IE type: {ie_type}) per 3GPP TS 29.244 R18"
    ///
    /// Security validation: zero-length IE protection.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_pfcp::error::messages;
    ///
    /// let error_msg = messages::zero_length_ie_not_allowed("F-TEID", 21);
    /// assert_eq!(
    ///     error_msg,
    ///     "Zero-length IE not allowed for F-TEID (IE type: 21) per 3GPP TS 29.244 R18"
    /// );
    /// ```
    pub fn zero_length_ie_not_allowed(ie_name: &str, ie_type: u16) -> String {
        format!(
            "Zero-length IE not allowed for {} (IE type: {}) per 3GPP TS 29.244 R18",
            ie_name, ie_type
        )
    }

    // ========================================================================
    // UTF-8 Encoding Errors
    // ========================================================================

    /// Format: "Invalid UTF-8 in {ie_name}"
    ///
    /// UTF-8 decoding failure in IE payload.
    ///
    /// # Examples
    ///
    /// ```
    /// use rs_pfcp::error::messages;
    ///
    /// let error_msg = messages::invalid_utf8("Application ID");
    /// assert_eq!(error_msg, "Invalid UTF-8 in Application ID");
    /// ```
    pub fn invalid_utf8(ie_name: &str) -> String {
        format!("Invalid UTF-8 in {}", ie_name)
    }

    // ========================================================================
    // Merge Engine Errors
    // ========================================================================

    /// Format: "merge target missing for {ie_name}"
    pub fn merge_target_missing(ie_name: &str) -> String {
        format!("merge target missing for {}", ie_name)
    }

    /// Format: "{ie_name} is multiple but carries no IE-ID"
    pub fn merge_id_missing(ie_name: &str) -> String {
        format!("{} is multiple but carries no IE-ID", ie_name)
    }

    /// Format: "no schema entry for base IE {ie_name}"
    pub fn merge_schema_missing(ie_name: &str) -> String {
        format!("no schema entry for base IE {}", ie_name)
    }

    // ========================================================================
    // Transport Errors
    // ========================================================================

    /// Format: "request timed out after {attempts} attempts (sequence {sequence})"
    pub fn request_timeout(sequence: u32, attempts: u32) -> String {
        format!(
            "request timed out after {} attempts (sequence {})",
            attempts, sequence
        )
    }

    /// Format: "response for unknown sequence {sequence}"
    pub fn unknown_sequence(sequence: u32) -> String {
        format!("response for unknown sequence {}", sequence)
    }

    /// Format: "duplicate response for sequence {sequence}"
    pub fn duplicate_response(sequence: u32) -> String {
        format!("duplicate response for sequence {}", sequence)
    }

    // ========================================================================
    // Peer / Session Errors
    // ========================================================================

    /// Format: "peer rejected request with cause {cause}"
    pub fn peer_reject(cause: u8) -> String {
        format!("peer rejected request with cause {}", cause)
    }

    /// Format: "session {seid:#x} not found"
    pub fn session_not_found(seid: u64) -> String {
        format!("session {:#x} not found", seid)
    }
}

use crate::ie::IeType;
use std::fmt;

/// Result alias used throughout the crate in place of `std::io::Result`.
pub type PfcpResult<T> = Result<T, PfcpError>;

/// Structured PFCP error taxonomy (§7 of the design).
///
/// Every variant's [`fmt::Display`] renders through the [`messages`] template
/// functions so error text reads in one consistent voice regardless of which
/// layer (codec, schema, merge, transport) raised it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PfcpError {
    // --- Codec ---
    TruncatedHeader { reason: String },
    MalformedHeader { expected: usize, actual: usize },
    IeOverflow { ie_type: IeType, available: usize, needed: usize },
    IeTooLarge { ie_type: IeType, len: usize },
    VendorIeUnsupported { raw_type: u16 },
    InvalidFieldEncoding { field: String, reason: String },

    // --- Schema ---
    MissingRequiredIe { ie_type: IeType, parent: IeType },
    UnexpectedIe { ie_type: IeType, parent: IeType },
    DuplicateIe { ie_type: IeType, parent: IeType },
    IdMissing { parent: IeType },
    IdOnGroup { ie_type: IeType },

    // --- Access ---
    IeNotFound { ie_type: IeType, path: Vec<IeType> },
    WrongLength { field: String },

    // --- Merge ---
    MergeTargetMissing { ie_type: IeType },
    MergeIdMissing { ie_type: IeType },
    MergeSchemaMissing { ie_type: IeType },

    // --- Transport ---
    RequestTimeout { sequence: u32, attempts: u32 },
    UnknownSequence { sequence: u32 },
    DuplicateResponse { sequence: u32 },

    // --- Peer ---
    PeerReject { cause: u8 },
    MissingCauseCode,

    // --- Session store ---
    SessionNotFound { seid: u64 },

    /// Socket-level failure surfaced verbatim from the OS.
    Io { reason: String },
}

impl fmt::Display for PfcpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PfcpError::TruncatedHeader { reason } => {
                write!(f, "{}", messages::too_short(reason))
            }
            PfcpError::MalformedHeader { expected, actual } => write!(
                f,
                "{}",
                messages::invalid_length("message header", *expected, *actual)
            ),
            PfcpError::IeOverflow { ie_type, available, needed } => write!(
                f,
                "{:?} declares length {} but only {} bytes remain",
                ie_type, needed, available
            ),
            PfcpError::IeTooLarge { ie_type, len } => {
                write!(f, "{:?} length {} exceeds 65535 bytes", ie_type, len)
            }
            PfcpError::VendorIeUnsupported { raw_type } => write!(
                f,
                "vendor-specific IE type {:#06x} is not supported",
                raw_type
            ),
            PfcpError::InvalidFieldEncoding { field, reason } => {
                write!(f, "{}", messages::invalid_value_reason(field, reason))
            }
            PfcpError::MissingRequiredIe { ie_type, parent } => write!(
                f,
                "{} (inside {:?})",
                messages::missing_mandatory_ie_short(&format!("{:?}", ie_type)),
                parent
            ),
            PfcpError::UnexpectedIe { ie_type, parent } => {
                write!(f, "{:?} is not a permitted child of {:?}", ie_type, parent)
            }
            PfcpError::DuplicateIe { ie_type, parent } => {
                write!(f, "duplicate {:?} inside {:?}", ie_type, parent)
            }
            PfcpError::IdMissing { parent } => write!(
                f,
                "{}",
                messages::ie_required(&format!("an IE-ID child of {:?}", parent))
            ),
            PfcpError::IdOnGroup { ie_type } => {
                write!(f, "{:?} is a group and cannot itself carry an IE-ID", ie_type)
            }
            PfcpError::IeNotFound { ie_type, path } => write!(
                f,
                "{} (path: {:?})",
                messages::ie_not_found(&format!("{:?}", ie_type)),
                path
            ),
            PfcpError::WrongLength { field } => write!(f, "{}", messages::payload_too_short(field)),
            PfcpError::MergeTargetMissing { ie_type } => write!(
                f,
                "{}",
                messages::merge_target_missing(&format!("{:?}", ie_type))
            ),
            PfcpError::MergeIdMissing { ie_type } => write!(
                f,
                "{}",
                messages::merge_id_missing(&format!("{:?}", ie_type))
            ),
            PfcpError::MergeSchemaMissing { ie_type } => write!(
                f,
                "{}",
                messages::merge_schema_missing(&format!("{:?}", ie_type))
            ),
            PfcpError::RequestTimeout { sequence, attempts } => {
                write!(f, "{}", messages::request_timeout(*sequence, *attempts))
            }
            PfcpError::UnknownSequence { sequence } => {
                write!(f, "{}", messages::unknown_sequence(*sequence))
            }
            PfcpError::DuplicateResponse { sequence } => {
                write!(f, "{}", messages::duplicate_response(*sequence))
            }
            PfcpError::PeerReject { cause } => write!(f, "{}", messages::peer_reject(*cause)),
            PfcpError::MissingCauseCode => write!(f, "response carries no Cause IE"),
            PfcpError::SessionNotFound { seid } => {
                write!(f, "{}", messages::session_not_found(*seid))
            }
            PfcpError::Io { reason } => write!(f, "I/O error: {}", reason),
        }
    }
}

impl std::error::Error for PfcpError {}

impl From<std::io::Error> for PfcpError {
    fn from(e: std::io::Error) -> Self {
        PfcpError::Io { reason: e.to_string() }
    }
}
