//! Common types used in the protocol.

use serde::{Deserialize, Serialize};

use crate::constants::*;

/// Frame direction, taken from header byte 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameType {
    /// Host → glasses.
    Command,
    /// Glasses → host.
    Response,
}

impl FrameType {
    /// Parse the header type byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            FRAME_TYPE_COMMAND => Some(FrameType::Command),
            FRAME_TYPE_RESPONSE => Some(FrameType::Response),
            _ => None,
        }
    }

    /// The header type byte.
    pub fn to_byte(self) -> u8 {
        match self {
            FrameType::Command => FRAME_TYPE_COMMAND,
            FrameType::Response => FRAME_TYPE_RESPONSE,
        }
    }
}

/// Two-byte service tag routing a frame's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ServiceId {
    /// High byte.
    pub category: u8,
    /// Low byte.
    pub subcategory: u8,
}

impl ServiceId {
    /// Authentication control.
    pub const AUTH_CONTROL: ServiceId = ServiceId::new(SVC_AUTH, SUB_CONTROL);
    /// Authentication data.
    pub const AUTH_DATA: ServiceId = ServiceId::new(SVC_AUTH, SUB_DATA);
    /// Display wake.
    pub const DISPLAY_WAKE: ServiceId = ServiceId::new(SVC_DISPLAY_WAKE, SUB_DATA);
    /// Teleprompter.
    pub const TELEPROMPTER: ServiceId = ServiceId::new(SVC_TELEPROMPTER, SUB_DATA);
    /// Dashboard.
    pub const DASHBOARD: ServiceId = ServiceId::new(SVC_DASHBOARD, SUB_DATA);
    /// Device info.
    pub const DEVICE_INFO: ServiceId = ServiceId::new(SVC_DEVICE_INFO, SUB_CONTROL);
    /// Speech transcription.
    pub const CONVERSATE: ServiceId = ServiceId::new(SVC_CONVERSATE, SUB_DATA);
    /// Tasks.
    pub const TASKS: ServiceId = ServiceId::new(SVC_TASKS, SUB_DATA);
    /// Configuration.
    pub const CONFIGURATION: ServiceId = ServiceId::new(SVC_CONFIGURATION, SUB_CONTROL);
    /// Display configuration.
    pub const DISPLAY_CONFIG: ServiceId = ServiceId::new(SVC_DISPLAY_CONFIG, SUB_DATA);
    /// Secondary speech transcription.
    pub const CONVERSATE_ALT: ServiceId = ServiceId::new(SVC_CONVERSATE_ALT, SUB_DATA);
    /// Commit.
    pub const COMMIT: ServiceId = ServiceId::new(SVC_COMMIT, SUB_DATA);
    /// Display trigger.
    pub const DISPLAY_TRIGGER: ServiceId = ServiceId::new(SVC_DISPLAY_TRIGGER, SUB_DATA);
    /// Touch-bar gesture notifications.
    pub const GESTURE: ServiceId = ServiceId::new(SVC_GESTURE, SUB_GESTURE);

    /// Create a service ID from its two bytes.
    pub const fn new(category: u8, subcategory: u8) -> Self {
        ServiceId {
            category,
            subcategory,
        }
    }

    /// The two header bytes.
    pub fn to_bytes(self) -> [u8; 2] {
        [self.category, self.subcategory]
    }

    /// Classify this tag.
    pub fn kind(self) -> ServiceKind {
        match (self.category, self.subcategory) {
            (SVC_AUTH, SUB_CONTROL) => ServiceKind::AuthControl,
            (SVC_AUTH, _) => ServiceKind::AuthData,
            (SVC_GESTURE, SUB_GESTURE) => ServiceKind::Gesture,
            (SVC_DISPLAY_WAKE, _) => ServiceKind::DisplayWake,
            (SVC_TELEPROMPTER, _) => ServiceKind::Teleprompter,
            (SVC_DASHBOARD, _) => ServiceKind::Dashboard,
            (SVC_DEVICE_INFO, _) => ServiceKind::DeviceInfo,
            (SVC_CONVERSATE, _) => ServiceKind::Conversate,
            (SVC_TASKS, _) => ServiceKind::Tasks,
            (SVC_CONFIGURATION, _) => ServiceKind::Configuration,
            (SVC_DISPLAY_CONFIG, _) => ServiceKind::DisplayConfig,
            (SVC_CONVERSATE_ALT, _) => ServiceKind::ConversateAlt,
            (SVC_COMMIT, _) => ServiceKind::Commit,
            (SVC_DISPLAY_TRIGGER, _) => ServiceKind::DisplayTrigger,
            _ => ServiceKind::Unknown,
        }
    }
}

impl std::fmt::Display for ServiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:02X}/0x{:02X}", self.category, self.subcategory)
    }
}

/// Known service categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    /// Authentication control.
    AuthControl,
    /// Authentication data.
    AuthData,
    /// Display wake.
    DisplayWake,
    /// Teleprompter.
    Teleprompter,
    /// Dashboard.
    Dashboard,
    /// Device info.
    DeviceInfo,
    /// Speech transcription.
    Conversate,
    /// Tasks.
    Tasks,
    /// Configuration.
    Configuration,
    /// Display configuration.
    DisplayConfig,
    /// Secondary speech transcription.
    ConversateAlt,
    /// Commit.
    Commit,
    /// Display trigger.
    DisplayTrigger,
    /// Touch-bar gestures.
    Gesture,
    /// Anything else.
    Unknown,
}

impl ServiceKind {
    /// Whether frames of this kind carry gesture byte pairs.
    pub fn is_gesture(self) -> bool {
        matches!(self, ServiceKind::Gesture | ServiceKind::DisplayTrigger)
    }

    /// Whether frames of this kind carry speech transcripts.
    pub fn is_speech(self) -> bool {
        matches!(self, ServiceKind::Conversate | ServiceKind::ConversateAlt)
    }

    /// Whether frames of this kind belong to the auth exchange.
    pub fn is_auth(self) -> bool {
        matches!(self, ServiceKind::AuthControl | ServiceKind::AuthData)
    }
}

/// Touch-bar gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    /// Single tap.
    Tap,
    /// Double tap.
    DoubleTap,
    /// Swipe forward.
    SwipeForward,
    /// Swipe backward.
    SwipeBackward,
    /// Long press.
    LongPress,
}

impl GestureKind {
    /// Map a gesture type code. Unknown codes return `None`.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            GESTURE_TAP => Some(GestureKind::Tap),
            GESTURE_DOUBLE_TAP => Some(GestureKind::DoubleTap),
            GESTURE_SWIPE_FORWARD => Some(GestureKind::SwipeForward),
            GESTURE_SWIPE_BACKWARD => Some(GestureKind::SwipeBackward),
            GESTURE_LONG_PRESS => Some(GestureKind::LongPress),
            _ => None,
        }
    }

    /// The gesture type code.
    pub fn code(self) -> u8 {
        match self {
            GestureKind::Tap => GESTURE_TAP,
            GestureKind::DoubleTap => GESTURE_DOUBLE_TAP,
            GestureKind::SwipeForward => GESTURE_SWIPE_FORWARD,
            GestureKind::SwipeBackward => GESTURE_SWIPE_BACKWARD,
            GestureKind::LongPress => GESTURE_LONG_PRESS,
        }
    }

    /// Bit used in the gesture-config mask.
    pub fn mask_bit(self) -> u64 {
        1 << (self.code() - 1)
    }

    /// Every gesture.
    pub const ALL: [GestureKind; 5] = [
        GestureKind::Tap,
        GestureKind::DoubleTap,
        GestureKind::SwipeForward,
        GestureKind::SwipeBackward,
        GestureKind::LongPress,
    ];
}

/// Teleprompter scrolling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollMode {
    /// Pages advance on gestures.
    #[default]
    Manual,
    /// Pages scroll on their own.
    Auto,
}

impl ScrollMode {
    /// Wire value.
    pub fn to_wire(self) -> u64 {
        match self {
            ScrollMode::Manual => 0,
            ScrollMode::Auto => 1,
        }
    }
}
