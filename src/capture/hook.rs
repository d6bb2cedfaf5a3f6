//! Process-wide fatal-signal hooks
//!
//! There is one hook per channel and at most one armed [`Capture`] owns each.
//! Arming a second capture on the same channel takes the hook over; the
//! previous owner is disarmed.
//!
//! - Exceptions: the process panic hook. The hook present before the first
//!   install is kept and restored on uninstall, and still runs for panics no
//!   capture claims.
//! - Rejections: [`report_rejection`], called by whoever observes an error
//!   nobody else will handle.
//!
//! [`Capture`]: super::Capture

use super::fatal::FatalError;
use super::handler::CaptureState;
use parking_lot::{const_mutex, Mutex};
use std::cell::Cell;
use std::panic::{self, PanicHookInfo};
use std::sync::{Arc, Weak};
use std::thread;

type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Send + Sync + 'static>;

/// The two fatal-signal channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Uncaught panics
    Exception,
    /// Errors reported through [`report_rejection`]
    Rejection,
}

impl Channel {
    /// Prefix of the diagnostic message
    pub fn prefix(self) -> &'static str {
        match self {
            Channel::Exception => "uncaughtException",
            Channel::Rejection => "unhandledRejection",
        }
    }
}

static EXCEPTION_OWNER: Mutex<Option<Weak<CaptureState>>> = const_mutex(None);
static REJECTION_OWNER: Mutex<Option<Weak<CaptureState>>> = const_mutex(None);

/// Panic hook displaced by ours; `Some` exactly while ours is installed
static PREVIOUS_HOOK: Mutex<Option<PanicHook>> = const_mutex(None);

thread_local! {
    static EXEMPT: Cell<bool> = const { Cell::new(false) };
    static REPORTING: Cell<bool> = const { Cell::new(false) };
}

fn owner_slot(channel: Channel) -> &'static Mutex<Option<Weak<CaptureState>>> {
    match channel {
        Channel::Exception => &EXCEPTION_OWNER,
        Channel::Rejection => &REJECTION_OWNER,
    }
}

fn current_owner(channel: Channel) -> Option<Arc<CaptureState>> {
    owner_slot(channel).lock().as_ref().and_then(Weak::upgrade)
}

/// Make `state` the owner of its channel
pub(crate) fn install(state: &Arc<CaptureState>) {
    let channel = state.channel();
    {
        let mut owner = owner_slot(channel).lock();
        if let Some(previous) = owner.as_ref().and_then(Weak::upgrade) {
            if !Arc::ptr_eq(&previous, state) {
                previous.disarm();
            }
        }
        *owner = Some(Arc::downgrade(state));
    }

    if channel == Channel::Exception && !thread::panicking() {
        let mut previous = PREVIOUS_HOOK.lock();
        if previous.is_none() {
            *previous = Some(panic::take_hook());
            panic::set_hook(Box::new(on_panic));
        }
    }
}

/// Give up ownership if `state` still holds it
pub(crate) fn uninstall(state: &CaptureState) {
    let channel = state.channel();
    {
        let mut owner = owner_slot(channel).lock();
        let owned = owner
            .as_ref()
            .map_or(false, |weak| std::ptr::eq(weak.as_ptr(), state));
        if !owned {
            return;
        }
        *owner = None;
    }

    // With no owner our hook only forwards; swapping hooks mid-panic would abort
    if channel == Channel::Exception && !thread::panicking() {
        if let Some(previous) = PREVIOUS_HOOK.lock().take() {
            let _ = panic::take_hook();
            panic::set_hook(previous);
        }
    }
}

fn on_panic(info: &PanicHookInfo<'_>) {
    let claimed = !EXEMPT.with(Cell::get) && !REPORTING.with(Cell::get);
    match current_owner(Channel::Exception).filter(|_| claimed) {
        Some(owner) => {
            REPORTING.with(|flag| flag.set(true));
            owner.report(&FatalError::from_panic(info));
            REPORTING.with(|flag| flag.set(false));
        }
        None => {
            if let Some(previous) = PREVIOUS_HOOK.lock().as_ref() {
                previous(info);
            }
        }
    }
}

/// Report an error no one observed, e.g. a detached task's failure.
///
/// Goes to the armed rejection capture if there is one; otherwise the error
/// is printed to stderr. Returns whether a capture took it.
///
/// # Example
///
/// ```
/// use logfan::capture::{report_rejection, FatalError};
///
/// // nothing armed: printed and reported as unclaimed
/// assert!(!report_rejection(FatalError::new("lost write")));
/// ```
pub fn report_rejection(err: FatalError) -> bool {
    match current_owner(Channel::Rejection) {
        Some(owner) => {
            owner.report(&err);
            true
        }
        None => {
            eprintln!("[LOGGER ERROR] Unhandled rejection: {}", err);
            false
        }
    }
}

/// Panics on this thread bypass capture.
///
/// Binding workers call this so a panicking sink surfaces as a transport
/// error instead of a crash.
pub(crate) fn exempt_current_thread() {
    EXEMPT.with(|flag| flag.set(true));
}
