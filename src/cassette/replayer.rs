//! Replays recorded backend interactions from a cassette.

use std::collections::{HashMap, VecDeque};

use super::format::{Cassette, Interaction};

/// Queue key: one replay stream per port/method pair.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
struct PortMethodKey {
    port: String,
    method: String,
}

/// Replays interactions from a loaded cassette.
///
/// Each port/method pair gets its own FIFO queue, so the quote pass and the
/// engineering call (both `backend::generate_text`) replay in recorded
/// order, independent of any interleaved image or video calls.
pub struct CassetteReplayer {
    queues: HashMap<PortMethodKey, VecDeque<Interaction>>,
}

impl CassetteReplayer {
    /// Create a new replayer from a loaded cassette.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut queues: HashMap<PortMethodKey, VecDeque<Interaction>> = HashMap::new();
        for interaction in &cassette.interactions {
            let key = PortMethodKey {
                port: interaction.port.clone(),
                method: interaction.method.clone(),
            };
            queues.entry(key).or_default().push_back(interaction.clone());
        }
        Self { queues }
    }

    /// Take the next recorded interaction for the given port and method.
    ///
    /// # Panics
    ///
    /// Panics when the cassette has no interactions recorded (or left) for
    /// the pair: the pipeline made a call the recording never saw, which is
    /// a broken fixture, not a runtime condition.
    pub fn next_interaction(&mut self, port: &str, method: &str) -> Interaction {
        let key = PortMethodKey { port: port.to_string(), method: method.to_string() };

        if let Some(interaction) = self.queues.get_mut(&key).and_then(VecDeque::pop_front) {
            return interaction;
        }

        let remaining: Vec<String> = self
            .queues
            .iter()
            .filter(|(_, queue)| !queue.is_empty())
            .map(|(k, queue)| format!("{}::{} x{}", k.port, k.method, queue.len()))
            .collect();
        panic!(
            "Cassette exhausted: no interactions recorded (or left) for port={port:?} \
             method={method:?}. Remaining: [{}]",
            remaining.join(", ")
        );
    }
}
