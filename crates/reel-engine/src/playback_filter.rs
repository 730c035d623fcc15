//! Mute/solo resolution with all-or-none solo semantics, applied top-down
//! across tracks, clips, and lanes before export.
//!
//! Grounded on `services/playback_filter.py`.

pub trait MuteSolo {
    fn is_muted(&self) -> bool;
    fn is_soloed(&self) -> bool;
}

impl MuteSolo for reel_model::Track {
    fn is_muted(&self) -> bool {
        self.is_muted
    }
    fn is_soloed(&self) -> bool {
        self.is_soloed
    }
}

impl MuteSolo for reel_model::Clip {
    fn is_muted(&self) -> bool {
        self.is_muted
    }
    fn is_soloed(&self) -> bool {
        self.is_soloed
    }
}

impl MuteSolo for reel_model::ClipPolyrhythmLane {
    fn is_muted(&self) -> bool {
        self.mute
    }
    fn is_soloed(&self) -> bool {
        self.solo
    }
}

/// Keep only the peers that should emit: with any soloed peer in `items`,
/// only soloed non-muted peers; otherwise every non-muted peer.
pub fn filter_for_playback<T: MuteSolo>(items: Vec<T>) -> Vec<T> {
    let any_solo = items.iter().any(|i| i.is_soloed());
    items
        .into_iter()
        .filter(|i| !i.is_muted() && (!any_solo || i.is_soloed()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Peer {
        name: &'static str,
        muted: bool,
        soloed: bool,
    }

    impl MuteSolo for Peer {
        fn is_muted(&self) -> bool {
            self.muted
        }
        fn is_soloed(&self) -> bool {
            self.soloed
        }
    }

    #[test]
    fn no_solo_keeps_all_non_muted() {
        let peers = vec![
            Peer { name: "a", muted: false, soloed: false },
            Peer { name: "b", muted: true, soloed: false },
        ];
        let kept = filter_for_playback(peers);
        assert_eq!(kept.iter().map(|p| p.name).collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn any_solo_keeps_only_soloed_non_muted() {
        let peers = vec![
            Peer { name: "a", muted: false, soloed: true },
            Peer { name: "b", muted: false, soloed: false },
            Peer { name: "c", muted: true, soloed: true },
        ];
        let kept = filter_for_playback(peers);
        assert_eq!(kept.iter().map(|p| p.name).collect::<Vec<_>>(), vec!["a"]);
    }
}
