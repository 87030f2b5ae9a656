use async_trait::async_trait;

use crate::model::Coordinate;

pub mod geoip;

/// Permission status as last reported by the location backend. Restriction
/// counts as denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    NotDetermined,
    Denied,
    Granted,
}

/// Asynchronous notifications from a location backend.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    AuthorizationChanged(Authorization),
    Position(Coordinate),
    Failed(String),
}

/// A location backend: permission handling plus a stream of notifications.
///
/// Everything the backend has to say arrives through `next_event`, so an
/// authorization change can show up before, during, or after an explicit
/// request.
#[async_trait]
pub trait LocationSource: Send {
    /// Last known permission status, without prompting.
    fn authorization(&self) -> Authorization;

    /// Ask for permission. The answer arrives as an event.
    fn request_authorization(&mut self);

    fn start_updates(&mut self);

    fn stop_updates(&mut self);

    /// Next notification, or `None` once the backend is done.
    async fn next_event(&mut self) -> Option<SourceEvent>;
}

/// Why an acquisition resolved without a coordinate.
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    PermissionDenied,
    Failed(String),
}

/// Result of one acquisition: a fix, or a signal to use the default city.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationOutcome {
    Fix(Coordinate),
    Fallback(FallbackReason),
}

/// One-shot location seam consumed by the screen. Each call is a fresh
/// acquisition.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn locate(&self) -> LocationOutcome;
}

/// Acquisition lifecycle, kept for transition logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackerPhase {
    Unauthorized,
    Pending,
    Authorized,
    Active,
    Failed,
}

/// Drives one source through a single fix acquisition.
///
/// Permission is requested at most once per acquisition, updates stop at
/// the first position, and denial or backend failure resolves into a
/// fallback signal.
pub struct FixTracker<S: LocationSource> {
    source: S,
    phase: TrackerPhase,
    requested: bool,
}

impl<S: LocationSource> FixTracker<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            phase: TrackerPhase::Unauthorized,
            requested: false,
        }
    }

    /// Run the acquisition to completion.
    pub async fn acquire(mut self) -> LocationOutcome {
        match self.source.authorization() {
            Authorization::NotDetermined => self.request_once(),
            Authorization::Denied => return self.fail_over(FallbackReason::PermissionDenied),
            Authorization::Granted => self.activate(),
        }

        while let Some(event) = self.source.next_event().await {
            match event {
                SourceEvent::AuthorizationChanged(Authorization::Granted) => {
                    if self.phase != TrackerPhase::Active {
                        self.activate();
                    }
                }
                SourceEvent::AuthorizationChanged(Authorization::Denied) => {
                    if self.phase == TrackerPhase::Active {
                        self.source.stop_updates();
                    }
                    return self.fail_over(FallbackReason::PermissionDenied);
                }
                SourceEvent::AuthorizationChanged(Authorization::NotDetermined) => {
                    self.request_once();
                }
                SourceEvent::Position(coordinate) => {
                    self.source.stop_updates();
                    tracing::debug!(
                        "Location fix at ({}, {})",
                        coordinate.latitude,
                        coordinate.longitude
                    );
                    return LocationOutcome::Fix(coordinate);
                }
                SourceEvent::Failed(reason) => {
                    if self.phase == TrackerPhase::Active {
                        self.source.stop_updates();
                    }
                    return self.fail_over(FallbackReason::Failed(reason));
                }
            }
        }

        self.fail_over(FallbackReason::Failed("location backend closed".to_string()))
    }

    fn request_once(&mut self) {
        if self.requested {
            return;
        }

        self.requested = true;
        self.set_phase(TrackerPhase::Pending);
        self.source.request_authorization();
    }

    fn activate(&mut self) {
        self.set_phase(TrackerPhase::Authorized);
        self.source.start_updates();
        self.set_phase(TrackerPhase::Active);
    }

    fn fail_over(&mut self, reason: FallbackReason) -> LocationOutcome {
        self.set_phase(TrackerPhase::Failed);
        LocationOutcome::Fallback(reason)
    }

    fn set_phase(&mut self, phase: TrackerPhase) {
        if self.phase != phase {
            tracing::debug!("Location phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }
}
