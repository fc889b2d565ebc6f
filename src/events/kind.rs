//! Closed set of SDK lifecycle events.
//!
//! Whether an event is silent (not logged) or retriggerable (forwarded from a
//! remote context to its creator) is a property of the kind itself.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // High-frequency UI micro-events
    NotifyButtonHovering,
    NotifyButtonHover,
    NotifyButtonButtonClick,
    NotifyButtonLauncherClick,
    AnimatedElementHiding,
    AnimatedElementHidden,
    AnimatedElementShowing,
    AnimatedElementShown,
    ActiveAnimatedElementActivating,
    ActiveAnimatedElementActive,
    ActiveAnimatedElementInactivating,
    ActiveAnimatedElementInactive,
    DbRetrieved,
    DbSet,
    TestEvent,

    /// SDK fully initialized; fires at most once per process
    SdkInitialized,
    HttpInitialize,
    DbRebuilt,
    SubscriptionSet,
    InternalSubscriptionSet,
    SendWelcomeNotification,
    SubscriptionChange,
    NotificationPermissionChange,
    Register,
    NotificationDisplay,
    NotificationDismiss,
    NotificationClick,
    PermissionPromptDisplay,
    CustomPromptClick,
    TestWouldDisplay,
    TestInitOptionDisabled,
    PopupLoad,
    PopupClose,
    PopupWindowTimeout,
    ModalLoaded,

    // Deprecated names kept for listeners that still use them
    LegacyPermissionChanged,
    LegacySubscriptionChanged,
    LegacyCustomPromptClicked,
}

impl EventKind {
    pub const ALL: [EventKind; 38] = [
        EventKind::NotifyButtonHovering,
        EventKind::NotifyButtonHover,
        EventKind::NotifyButtonButtonClick,
        EventKind::NotifyButtonLauncherClick,
        EventKind::AnimatedElementHiding,
        EventKind::AnimatedElementHidden,
        EventKind::AnimatedElementShowing,
        EventKind::AnimatedElementShown,
        EventKind::ActiveAnimatedElementActivating,
        EventKind::ActiveAnimatedElementActive,
        EventKind::ActiveAnimatedElementInactivating,
        EventKind::ActiveAnimatedElementInactive,
        EventKind::DbRetrieved,
        EventKind::DbSet,
        EventKind::TestEvent,
        EventKind::SdkInitialized,
        EventKind::HttpInitialize,
        EventKind::DbRebuilt,
        EventKind::SubscriptionSet,
        EventKind::InternalSubscriptionSet,
        EventKind::SendWelcomeNotification,
        EventKind::SubscriptionChange,
        EventKind::NotificationPermissionChange,
        EventKind::Register,
        EventKind::NotificationDisplay,
        EventKind::NotificationDismiss,
        EventKind::NotificationClick,
        EventKind::PermissionPromptDisplay,
        EventKind::CustomPromptClick,
        EventKind::TestWouldDisplay,
        EventKind::TestInitOptionDisabled,
        EventKind::PopupLoad,
        EventKind::PopupClose,
        EventKind::PopupWindowTimeout,
        EventKind::ModalLoaded,
        EventKind::LegacyPermissionChanged,
        EventKind::LegacySubscriptionChanged,
        EventKind::LegacyCustomPromptClicked,
    ];

    /// Name subscribers and the wire use
    pub fn name(self) -> &'static str {
        match self {
            EventKind::NotifyButtonHovering => "notifyButtonHovering",
            EventKind::NotifyButtonHover => "notifyButtonHover",
            EventKind::NotifyButtonButtonClick => "notifyButtonButtonClick",
            EventKind::NotifyButtonLauncherClick => "notifyButtonLauncherClick",
            EventKind::AnimatedElementHiding => "animatedElementHiding",
            EventKind::AnimatedElementHidden => "animatedElementHidden",
            EventKind::AnimatedElementShowing => "animatedElementShowing",
            EventKind::AnimatedElementShown => "animatedElementShown",
            EventKind::ActiveAnimatedElementActivating => "activeAnimatedElementActivating",
            EventKind::ActiveAnimatedElementActive => "activeAnimatedElementActive",
            EventKind::ActiveAnimatedElementInactivating => "activeAnimatedElementInactivating",
            EventKind::ActiveAnimatedElementInactive => "activeAnimatedElementInactive",
            EventKind::DbRetrieved => "dbRetrieved",
            EventKind::DbSet => "dbSet",
            EventKind::TestEvent => "testEvent",
            EventKind::SdkInitialized => "initialize",
            EventKind::HttpInitialize => "httpInitialize",
            EventKind::DbRebuilt => "dbRebuilt",
            EventKind::SubscriptionSet => "subscriptionSet",
            EventKind::InternalSubscriptionSet => "onesignal.internal.subscriptionset",
            EventKind::SendWelcomeNotification => "sendWelcomeNotification",
            EventKind::SubscriptionChange => "subscriptionChange",
            EventKind::NotificationPermissionChange => "notificationPermissionChange",
            EventKind::Register => "register",
            EventKind::NotificationDisplay => "notificationDisplay",
            EventKind::NotificationDismiss => "notificationDismiss",
            EventKind::NotificationClick => "notificationClick",
            EventKind::PermissionPromptDisplay => "permissionPromptDisplay",
            EventKind::CustomPromptClick => "customPromptClick",
            EventKind::TestWouldDisplay => "testWouldDisplay",
            EventKind::TestInitOptionDisabled => "testInitOptionDisabled",
            EventKind::PopupLoad => "popupLoad",
            EventKind::PopupClose => "popupClose",
            EventKind::PopupWindowTimeout => "popupWindowTimeout",
            EventKind::ModalLoaded => "modalLoaded",
            EventKind::LegacyPermissionChanged => "onesignal.prompt.native.permissionchanged",
            EventKind::LegacySubscriptionChanged => "onesignal.subscription.changed",
            EventKind::LegacyCustomPromptClicked => "onesignal.prompt.custom.clicked",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    /// Not logged when fired
    pub fn is_silent(self) -> bool {
        matches!(
            self,
            EventKind::NotifyButtonHovering
                | EventKind::NotifyButtonHover
                | EventKind::NotifyButtonButtonClick
                | EventKind::NotifyButtonLauncherClick
                | EventKind::AnimatedElementHiding
                | EventKind::AnimatedElementHidden
                | EventKind::AnimatedElementShowing
                | EventKind::AnimatedElementShown
                | EventKind::ActiveAnimatedElementActivating
                | EventKind::ActiveAnimatedElementActive
                | EventKind::ActiveAnimatedElementInactivating
                | EventKind::ActiveAnimatedElementInactive
                | EventKind::DbRetrieved
                | EventKind::DbSet
                | EventKind::TestEvent
        )
    }

    /// Forwarded to the creator when fired inside a popup or proxy frame
    pub fn is_retriggerable(self) -> bool {
        matches!(
            self,
            EventKind::LegacyCustomPromptClicked
                | EventKind::LegacyPermissionChanged
                | EventKind::LegacySubscriptionChanged
                | EventKind::InternalSubscriptionSet
                | EventKind::DbRebuilt
                | EventKind::SdkInitialized
                | EventKind::SubscriptionSet
                | EventKind::SendWelcomeNotification
                | EventKind::SubscriptionChange
                | EventKind::NotificationPermissionChange
                | EventKind::DbSet
                | EventKind::Register
                | EventKind::NotificationDisplay
                | EventKind::NotificationDismiss
                | EventKind::NotificationClick
                | EventKind::PermissionPromptDisplay
                | EventKind::TestWouldDisplay
                | EventKind::TestInitOptionDisabled
                | EventKind::PopupWindowTimeout
        )
    }

    /// Deprecated name fired alongside this event
    pub fn legacy_alias(self) -> Option<EventKind> {
        match self {
            EventKind::NotificationPermissionChange => Some(EventKind::LegacyPermissionChanged),
            EventKind::SubscriptionChange => Some(EventKind::LegacySubscriptionChanged),
            EventKind::CustomPromptClick => Some(EventKind::LegacyCustomPromptClicked),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
