//! Plain and transactional pipelines.

use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use kvmock_common::error::{MockError, MockResult};
use kvmock_core::command::{CommandFrame, Reply};
use kvmock_core::interceptor::Interceptor;

use crate::cmd::Cmder;
use crate::commands::Commands;

/// Slot of one command queued on a [`Pipeline`], redeemed against [`PipelineResults`].
pub struct Queued<C> {
    index: usize,
    _cmd: PhantomData<fn() -> C>,
}

impl<C> Queued<C> {
    /// Position of the command inside its pipeline.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }
}

impl<C> Clone for Queued<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Queued<C> {}

impl<C> fmt::Debug for Queued<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queued").field("index", &self.index).finish()
    }
}

/// Command batch sent to the interceptor in one call on [`Pipeline::exec`].
///
/// A transactional pipeline is bracketed by the begin and end sentinels; when the bracket
/// cannot be matched every queued command carries the batch error.
pub struct Pipeline {
    interceptor: Arc<dyn Interceptor>,
    transactional: bool,
    queued: Mutex<Vec<Box<dyn Cmder>>>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("transactional", &self.transactional)
            .field("queued", &self.len())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub(crate) fn new(interceptor: Arc<dyn Interceptor>, transactional: bool) -> Self {
        Self {
            interceptor,
            transactional,
            queued: Mutex::new(Vec::new()),
        }
    }

    /// Whether the batch is sent as a transaction.
    #[must_use]
    pub fn is_transactional(&self) -> bool {
        self.transactional
    }

    /// Number of queued commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops every queued command.
    pub fn discard(&self) {
        self.lock().clear();
    }

    /// Sends the queued commands and returns their populated results.
    ///
    /// An empty pipeline sends nothing.
    #[must_use]
    pub fn exec(self) -> PipelineResults {
        let mut cmds = self
            .queued
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        if cmds.is_empty() {
            return PipelineResults {
                cmds,
                batch_err: None,
            };
        }

        let frames = cmds
            .iter()
            .map(|cmd| cmd.frame().clone())
            .collect::<Vec<CommandFrame>>();
        tracing::trace!(
            commands = frames.len(),
            transactional = self.transactional,
            "executing pipeline"
        );

        let mut batch_err = None;
        if self.transactional {
            match self.interceptor.process_transaction(&frames) {
                Ok(replies) => apply_all(&mut cmds, replies),
                Err(error) => {
                    tracing::debug!(%error, "transactional pipeline rejected");
                    for cmd in &mut cmds {
                        cmd.apply(Err(error.clone()));
                    }
                    batch_err = Some(error);
                }
            }
        } else {
            let replies = self.interceptor.process_pipeline(&frames);
            apply_all(&mut cmds, replies);
        }
        PipelineResults { cmds, batch_err }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Box<dyn Cmder>>> {
        self.queued.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn apply_all(cmds: &mut [Box<dyn Cmder>], replies: Vec<MockResult<Reply>>) {
    for (cmd, reply) in cmds.iter_mut().zip(replies) {
        cmd.apply(reply);
    }
}

impl Commands for Pipeline {
    type Output<C: Cmder> = Queued<C>;

    fn run<C: Cmder>(&self, cmd: C) -> Queued<C> {
        let mut queued = self.lock();
        queued.push(Box::new(cmd));
        Queued {
            index: queued.len() - 1,
            _cmd: PhantomData,
        }
    }
}

/// Populated commands of one executed pipeline.
#[derive(Debug)]
pub struct PipelineResults {
    cmds: Vec<Box<dyn Cmder>>,
    batch_err: Option<MockError>,
}

impl PipelineResults {
    /// Command queued under `slot`.
    #[must_use]
    pub fn get<C: Cmder>(&self, slot: &Queued<C>) -> Option<&C> {
        self.cmds.get(slot.index)?.as_any().downcast_ref::<C>()
    }

    /// Every command in queue order.
    pub fn cmds(&self) -> impl Iterator<Item = &dyn Cmder> {
        self.cmds.iter().map(|cmd| &**cmd)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cmds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cmds.is_empty()
    }

    /// Batch error of a rejected transaction, otherwise the first failed command's error.
    #[must_use]
    pub fn first_err(&self) -> Option<&MockError> {
        self.batch_err
            .as_ref()
            .or_else(|| self.cmds.iter().find_map(|cmd| cmd.error()))
    }

    /// Aggregate outcome of the batch.
    ///
    /// # Errors
    ///
    /// Returns [`Self::first_err`] when present.
    pub fn result(&self) -> MockResult<()> {
        self.first_err().map_or(Ok(()), |error| Err(error.clone()))
    }
}
