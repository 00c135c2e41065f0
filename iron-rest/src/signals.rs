//! Process signals the timer reacts to

use std::io;

/// What a received signal means for the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// Ctrl-Z: the process is about to stop
    Suspend,
    /// Continued after a stop
    Resume,
    /// Ctrl-C or termination request
    Interrupt,
}

#[cfg(unix)]
pub use self::unix::SignalListener;

#[cfg(not(unix))]
pub use self::fallback::SignalListener;

#[cfg(unix)]
mod unix {
    use super::{io, ControlSignal};
    use futures::stream::StreamExt;
    use signal_hook::consts::{SIGCONT, SIGINT, SIGTERM, SIGTSTP};
    use signal_hook_tokio::{Handle, Signals};

    pub struct SignalListener {
        signals: Signals,
        handle: Handle,
    }

    impl SignalListener {
        pub fn new() -> io::Result<Self> {
            let signals = Signals::new([SIGINT, SIGTERM, SIGTSTP, SIGCONT])?;
            let handle = signals.handle();
            Ok(Self { signals, handle })
        }

        pub async fn recv(&mut self) -> Option<ControlSignal> {
            let signal = self.signals.next().await?;
            Some(match signal {
                SIGTSTP => ControlSignal::Suspend,
                SIGCONT => ControlSignal::Resume,
                _ => ControlSignal::Interrupt,
            })
        }

        /// Stop the process the way an unhandled SIGTSTP would
        ///
        /// Returns once the process has been continued.
        pub fn suspend_process(&self) -> io::Result<()> {
            signal_hook::low_level::emulate_default_handler(SIGTSTP)
        }

        pub fn close(&self) {
            self.handle.close();
        }
    }
}

#[cfg(not(unix))]
mod fallback {
    use super::{io, ControlSignal};

    /// Only Ctrl-C is observable here; there is no job control
    pub struct SignalListener;

    impl SignalListener {
        pub fn new() -> io::Result<Self> {
            Ok(Self)
        }

        pub async fn recv(&mut self) -> Option<ControlSignal> {
            tokio::signal::ctrl_c().await.ok()?;
            Some(ControlSignal::Interrupt)
        }

        pub fn suspend_process(&self) -> io::Result<()> {
            Ok(())
        }

        pub fn close(&self) {}
    }
}
