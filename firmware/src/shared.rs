//! Cross-core state: the single physical SWD bus and the arbiter that
//! gates it. Core 0's `DapEngine` and core 1's `RttEngine` both reach the
//! same `SwdHost<PioSwd<SM0>>` instance rather than each owning their own,
//! since two instances would drift `cached_select`/`cached_csw` apart on
//! every handoff. Guarded by software (the [`Arbiter`]), not a second
//! hardware mutex: the PIO state machine itself has no notion of an owner.

use core::cell::UnsafeCell;

use probe_bsp::pio_swd::PioSwd;
use probe_core::arbiter::Arbiter;
use probe_core::swd::SwdHost;
use rp2040_hal::pio::SM0;

pub static ARBITER: Arbiter = Arbiter::new(20);

struct HostCell(UnsafeCell<Option<SwdHost<PioSwd<SM0>>>>);

// Safety: access is only ever through `with_host`, which requires the
// caller to already hold `ARBITER` for the current core, so the two
// cores never touch the cell concurrently.
unsafe impl Sync for HostCell {}

static HOST: HostCell = HostCell(UnsafeCell::new(None));

/// Install the shared host. Must be called exactly once, from core 0,
/// before `spawn_core1` starts running code that calls `with_host`.
pub unsafe fn init(host: SwdHost<PioSwd<SM0>>) {
    *HOST.0.get() = Some(host);
}

/// Run `f` against the shared host. Callers must hold `ARBITER` (for
/// whichever `Holder` they are) for the duration of this call.
pub unsafe fn with_host<R>(f: impl FnOnce(&mut SwdHost<PioSwd<SM0>>) -> R) -> R {
    let host = (*HOST.0.get()).as_mut().expect("shared::init not called yet");
    f(host)
}
