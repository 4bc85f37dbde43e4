use std::fmt::Debug;

use tokio::sync::mpsc;

use super::state::ChatState;
use crate::ChatClosedError;

/// A unit of work that runs on the chat task.
pub(crate) trait Command: Send + Debug + 'static {
    /// Applies the command with mutable access to the chat state.
    fn apply(self: Box<Self>, state: &mut ChatState, mailbox: &Mailbox);
}

type BoxedCommand = Box<dyn Command>;

#[derive(Clone)]
pub(crate) struct Mailbox {
    tx: mpsc::UnboundedSender<BoxedCommand>,
}

impl Mailbox {
    #[inline]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<BoxedCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    #[inline]
    pub fn send<C: Command>(&self, command: C) -> Result<(), ChatClosedError> {
        self.tx.send(Box::new(command)).map_err(|_| ChatClosedError)
    }

    #[inline]
    pub fn downgrade(&self) -> WeakMailbox {
        WeakMailbox {
            tx: self.tx.downgrade(),
        }
    }
}

/// A mailbox reference that doesn't keep the chat task alive.
#[derive(Clone)]
pub(crate) struct WeakMailbox {
    tx: mpsc::WeakUnboundedSender<BoxedCommand>,
}

impl WeakMailbox {
    #[inline]
    pub fn upgrade(&self) -> Option<Mailbox> {
        self.tx.upgrade().map(|tx| Mailbox { tx })
    }
}

/// Processes commands one at a time until every strong mailbox is gone.
pub(crate) async fn run_chat(
    mailbox: WeakMailbox,
    mut state: ChatState,
    mut command_rx: mpsc::UnboundedReceiver<BoxedCommand>,
) {
    debug!("started");
    while let Some(command) = command_rx.recv().await {
        trace!("received command: {command:?}");

        let Some(mailbox) = mailbox.upgrade() else {
            warn!("last mailbox has been dropped, discard the command");
            break;
        };

        let proc_span = trace_span!("apply command");
        proc_span.in_scope(|| {
            command.apply(&mut state, &mailbox);
            trace!("finished");
        });
    }
    debug!("will terminate");
}
