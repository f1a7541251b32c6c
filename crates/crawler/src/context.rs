use crawler_core::OnionAddress;
use rand::seq::SliceRandom;
use rand::Rng;

/// Per-run working state: a shuffled snapshot of the frontier consumed one
/// address at a time, plus the progress counter the loop runs against.
#[derive(Debug, Clone)]
pub struct RunContext {
    queue: Vec<OnionAddress>,
    discarded: Vec<OnionAddress>,
    progress: usize,
    target: usize,
}

impl RunContext {
    pub fn new<R: Rng + ?Sized>(mut onions: Vec<OnionAddress>, rng: &mut R) -> Self {
        onions.shuffle(rng);
        let target = onions.len();
        RunContext { queue: onions, discarded: Vec::new(), progress: 0, target }
    }

    pub fn pop(&mut self) -> Option<OnionAddress> {
        self.queue.pop()
    }

    /// Park an address that timed out. It is not handed out again this run.
    pub fn discard(&mut self, onion: OnionAddress) {
        self.discarded.push(onion);
    }

    pub fn advance(&mut self) {
        self.progress += 1;
    }

    pub fn is_done(&self) -> bool {
        self.progress >= self.target
    }

    pub fn progress(&self) -> usize { self.progress }
    pub fn target(&self) -> usize { self.target }
    pub fn remaining(&self) -> usize { self.queue.len() }
    pub fn discarded(&self) -> &[OnionAddress] { &self.discarded }
}
