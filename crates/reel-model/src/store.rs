//! A storage abstraction over the domain entities. `InMemoryStore` is the
//! only implementation the core ships; schema migrations, query
//! construction, and transaction plumbing for a real backing store are
//! explicitly out of scope and left to an adapter.

use std::collections::BTreeMap;
use std::sync::Mutex;

use uuid::Uuid;

use crate::{
    ChordEvent, ChordProgressionRun, Clip, ClipPolyrhythmLane, DrumMapProfile, GenerationRun,
    ModelError, Note, PolyrhythmProfile, Project, Result, Track,
};

/// Read/write access to the domain entities. `delete_then_insert_notes` and
/// `delete_then_insert_chord_events` are atomic with respect to concurrent
/// readers of the same clip: a reader never observes a state with the old
/// content removed but the new content not yet present.
pub trait Store: Send + Sync {
    fn insert_project(&self, project: Project) -> Result<Project>;
    fn get_project(&self, id: Uuid) -> Result<Project>;
    fn list_projects(&self) -> Vec<Project>;
    fn update_project(&self, project: Project) -> Result<Project>;
    fn delete_project(&self, id: Uuid) -> Result<()>;

    fn insert_track(&self, track: Track) -> Result<Track>;
    fn get_track(&self, id: Uuid) -> Result<Track>;
    fn list_tracks_by_project(&self, project_id: Uuid) -> Vec<Track>;
    fn update_track(&self, track: Track) -> Result<Track>;

    fn insert_clip(&self, clip: Clip) -> Result<Clip>;
    fn get_clip(&self, id: Uuid) -> Result<Clip>;
    fn list_clips_by_track(&self, track_id: Uuid) -> Vec<Clip>;
    fn update_clip(&self, clip: Clip) -> Result<Clip>;

    fn list_notes_by_clip(&self, clip_id: Uuid) -> Vec<Note>;
    fn delete_then_insert_notes(&self, clip_id: Uuid, notes: Vec<Note>) -> Result<()>;

    fn list_chord_events_by_clip(&self, clip_id: Uuid) -> Vec<ChordEvent>;
    fn get_chord_event(&self, id: Uuid) -> Result<ChordEvent>;
    fn update_chord_event(&self, event: ChordEvent, allow_unlock: bool) -> Result<ChordEvent>;
    fn delete_then_insert_chord_events(&self, clip_id: Uuid, events: Vec<ChordEvent>) -> Result<()>;

    fn insert_polyrhythm_profile(&self, profile: PolyrhythmProfile) -> Result<PolyrhythmProfile>;
    fn get_polyrhythm_profile(&self, id: Uuid) -> Result<PolyrhythmProfile>;
    fn list_polyrhythm_profiles(&self) -> Vec<PolyrhythmProfile>;

    fn insert_lane(&self, lane: ClipPolyrhythmLane) -> Result<ClipPolyrhythmLane>;
    fn list_lanes_by_clip(&self, clip_id: Uuid) -> Vec<ClipPolyrhythmLane>;

    fn insert_drum_map(&self, profile: DrumMapProfile) -> Result<DrumMapProfile>;
    fn get_drum_map(&self, id: Uuid) -> Result<DrumMapProfile>;
    fn list_drum_maps(&self) -> Vec<DrumMapProfile>;

    fn record_generation_run(&self, run: GenerationRun) -> GenerationRun;
    fn record_chord_progression_run(&self, run: ChordProgressionRun) -> ChordProgressionRun;
    fn get_chord_progression_run(&self, id: Uuid) -> Result<ChordProgressionRun>;
}

#[derive(Default)]
struct StoreData {
    projects: BTreeMap<Uuid, Project>,
    tracks: BTreeMap<Uuid, Track>,
    clips: BTreeMap<Uuid, Clip>,
    notes: BTreeMap<Uuid, Note>,
    chord_events: BTreeMap<Uuid, ChordEvent>,
    polyrhythm_profiles: BTreeMap<Uuid, PolyrhythmProfile>,
    lanes: BTreeMap<Uuid, ClipPolyrhythmLane>,
    drum_maps: BTreeMap<Uuid, DrumMapProfile>,
    generation_runs: BTreeMap<Uuid, GenerationRun>,
    chord_progression_runs: BTreeMap<Uuid, ChordProgressionRun>,
}

/// A `Mutex`-guarded in-memory store. Every mutation takes the lock for the
/// span of one logical transaction (including atomic delete-then-insert),
/// so no partial write is ever visible to a concurrent reader.
#[derive(Default)]
pub struct InMemoryStore {
    data: Mutex<StoreData>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found<T>(entity: &'static str, id: Uuid) -> Result<T> {
    Err(ModelError::NotFound { entity, id })
}

impl Store for InMemoryStore {
    fn insert_project(&self, project: Project) -> Result<Project> {
        project.validate()?;
        let mut data = self.data.lock().unwrap();
        data.projects.insert(project.id, project.clone());
        Ok(project)
    }

    fn get_project(&self, id: Uuid) -> Result<Project> {
        self.data
            .lock()
            .unwrap()
            .projects
            .get(&id)
            .cloned()
            .ok_or(ModelError::NotFound { entity: "project", id })
    }

    fn list_projects(&self) -> Vec<Project> {
        self.data.lock().unwrap().projects.values().cloned().collect()
    }

    fn update_project(&self, project: Project) -> Result<Project> {
        project.validate()?;
        let mut data = self.data.lock().unwrap();
        if !data.projects.contains_key(&project.id) {
            return not_found("project", project.id);
        }
        data.projects.insert(project.id, project.clone());
        Ok(project)
    }

    fn delete_project(&self, id: Uuid) -> Result<()> {
        let mut data = self.data.lock().unwrap();
        if data.projects.remove(&id).is_none() {
            return not_found("project", id);
        }
        let track_ids: Vec<Uuid> = data
            .tracks
            .values()
            .filter(|t| t.project_id == id)
            .map(|t| t.id)
            .collect();
        for track_id in track_ids {
            data.tracks.remove(&track_id);
            let clip_ids: Vec<Uuid> = data
                .clips
                .values()
                .filter(|c| c.track_id == track_id)
                .map(|c| c.id)
                .collect();
            for clip_id in clip_ids {
                data.clips.remove(&clip_id);
                data.notes.retain(|_, n| n.clip_id != clip_id);
                data.chord_events.retain(|_, e| e.clip_id != clip_id);
                data.lanes.retain(|_, l| l.clip_id != clip_id);
            }
        }
        Ok(())
    }

    fn insert_track(&self, track: Track) -> Result<Track> {
        track.validate()?;
        let mut data = self.data.lock().unwrap();
        if !data.projects.contains_key(&track.project_id) {
            return not_found("project", track.project_id);
        }
        data.tracks.insert(track.id, track.clone());
        Ok(track)
    }

    fn get_track(&self, id: Uuid) -> Result<Track> {
        self.data
            .lock()
            .unwrap()
            .tracks
            .get(&id)
            .cloned()
            .ok_or(ModelError::NotFound { entity: "track", id })
    }

    fn list_tracks_by_project(&self, project_id: Uuid) -> Vec<Track> {
        self.data
            .lock()
            .unwrap()
            .tracks
            .values()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect()
    }

    fn update_track(&self, track: Track) -> Result<Track> {
        track.validate()?;
        let mut data = self.data.lock().unwrap();
        if !data.tracks.contains_key(&track.id) {
            return not_found("track", track.id);
        }
        data.tracks.insert(track.id, track.clone());
        Ok(track)
    }

    fn insert_clip(&self, clip: Clip) -> Result<Clip> {
        clip.validate()?;
        let mut data = self.data.lock().unwrap();
        if !data.tracks.contains_key(&clip.track_id) {
            return not_found("track", clip.track_id);
        }
        data.clips.insert(clip.id, clip.clone());
        Ok(clip)
    }

    fn get_clip(&self, id: Uuid) -> Result<Clip> {
        self.data
            .lock()
            .unwrap()
            .clips
            .get(&id)
            .cloned()
            .ok_or(ModelError::NotFound { entity: "clip", id })
    }

    fn list_clips_by_track(&self, track_id: Uuid) -> Vec<Clip> {
        self.data
            .lock()
            .unwrap()
            .clips
            .values()
            .filter(|c| c.track_id == track_id)
            .cloned()
            .collect()
    }

    fn update_clip(&self, clip: Clip) -> Result<Clip> {
        clip.validate()?;
        let mut data = self.data.lock().unwrap();
        if !data.clips.contains_key(&clip.id) {
            return not_found("clip", clip.id);
        }
        data.clips.insert(clip.id, clip.clone());
        Ok(clip)
    }

    fn list_notes_by_clip(&self, clip_id: Uuid) -> Vec<Note> {
        self.data
            .lock()
            .unwrap()
            .notes
            .values()
            .filter(|n| n.clip_id == clip_id)
            .cloned()
            .collect()
    }

    fn delete_then_insert_notes(&self, clip_id: Uuid, notes: Vec<Note>) -> Result<()> {
        for note in &notes {
            note.validate()?;
        }
        let mut data = self.data.lock().unwrap();
        if !data.clips.contains_key(&clip_id) {
            return not_found("clip", clip_id);
        }
        data.notes.retain(|_, n| n.clip_id != clip_id);
        for note in notes {
            data.notes.insert(note.id, note);
        }
        Ok(())
    }

    fn list_chord_events_by_clip(&self, clip_id: Uuid) -> Vec<ChordEvent> {
        self.data
            .lock()
            .unwrap()
            .chord_events
            .values()
            .filter(|e| e.clip_id == clip_id)
            .cloned()
            .collect()
    }

    fn get_chord_event(&self, id: Uuid) -> Result<ChordEvent> {
        self.data
            .lock()
            .unwrap()
            .chord_events
            .get(&id)
            .cloned()
            .ok_or(ModelError::NotFound { entity: "chord_event", id })
    }

    fn update_chord_event(&self, event: ChordEvent, allow_unlock: bool) -> Result<ChordEvent> {
        let mut data = self.data.lock().unwrap();
        let existing = data
            .chord_events
            .get(&event.id)
            .ok_or(ModelError::NotFound { entity: "chord_event", id: event.id })?;
        existing.assert_mutable(allow_unlock)?;
        data.chord_events.insert(event.id, event.clone());
        Ok(event)
    }

    fn delete_then_insert_chord_events(&self, clip_id: Uuid, events: Vec<ChordEvent>) -> Result<()> {
        let mut data = self.data.lock().unwrap();
        if !data.clips.contains_key(&clip_id) {
            return not_found("clip", clip_id);
        }
        // Bulk regen replaces all chord events unconditionally, locked or not.
        // The lock invariant only gates single-event mutation (update_chord_event).
        data.chord_events.retain(|_, e| e.clip_id != clip_id);
        for event in events {
            data.chord_events.insert(event.id, event);
        }
        Ok(())
    }

    fn insert_polyrhythm_profile(&self, profile: PolyrhythmProfile) -> Result<PolyrhythmProfile> {
        profile.validate()?;
        let mut data = self.data.lock().unwrap();
        data.polyrhythm_profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    fn get_polyrhythm_profile(&self, id: Uuid) -> Result<PolyrhythmProfile> {
        self.data
            .lock()
            .unwrap()
            .polyrhythm_profiles
            .get(&id)
            .cloned()
            .ok_or(ModelError::NotFound { entity: "polyrhythm_profile", id })
    }

    fn list_polyrhythm_profiles(&self) -> Vec<PolyrhythmProfile> {
        self.data.lock().unwrap().polyrhythm_profiles.values().cloned().collect()
    }

    fn insert_lane(&self, lane: ClipPolyrhythmLane) -> Result<ClipPolyrhythmLane> {
        let mut data = self.data.lock().unwrap();
        if !data.clips.contains_key(&lane.clip_id) {
            return not_found("clip", lane.clip_id);
        }
        if !data.polyrhythm_profiles.contains_key(&lane.polyrhythm_profile_id) {
            return not_found("polyrhythm_profile", lane.polyrhythm_profile_id);
        }
        data.lanes.insert(lane.id, lane.clone());
        Ok(lane)
    }

    fn list_lanes_by_clip(&self, clip_id: Uuid) -> Vec<ClipPolyrhythmLane> {
        self.data
            .lock()
            .unwrap()
            .lanes
            .values()
            .filter(|l| l.clip_id == clip_id)
            .cloned()
            .collect()
    }

    fn insert_drum_map(&self, profile: DrumMapProfile) -> Result<DrumMapProfile> {
        let mut data = self.data.lock().unwrap();
        if data.drum_maps.values().any(|p| p.name == profile.name) {
            return Err(ModelError::InvariantViolation {
                field: "name",
                constraint: "drum map names must be unique".into(),
            });
        }
        data.drum_maps.insert(profile.id, profile.clone());
        Ok(profile)
    }

    fn get_drum_map(&self, id: Uuid) -> Result<DrumMapProfile> {
        self.data
            .lock()
            .unwrap()
            .drum_maps
            .get(&id)
            .cloned()
            .ok_or(ModelError::NotFound { entity: "drum_map", id })
    }

    fn list_drum_maps(&self) -> Vec<DrumMapProfile> {
        self.data.lock().unwrap().drum_maps.values().cloned().collect()
    }

    fn record_generation_run(&self, run: GenerationRun) -> GenerationRun {
        let mut data = self.data.lock().unwrap();
        data.generation_runs.insert(run.id, run.clone());
        run
    }

    fn record_chord_progression_run(&self, run: ChordProgressionRun) -> ChordProgressionRun {
        let mut data = self.data.lock().unwrap();
        data.chord_progression_runs.insert(run.id, run.clone());
        run
    }

    fn get_chord_progression_run(&self, id: Uuid) -> Result<ChordProgressionRun> {
        self.data
            .lock()
            .unwrap()
            .chord_progression_runs
            .get(&id)
            .cloned()
            .ok_or(ModelError::NotFound { entity: "chord_progression_run", id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GridMode, Mode, TrackRole};

    fn sample_project() -> Project {
        Project {
            id: Uuid::new_v4(),
            name: "demo".into(),
            bpm: 120,
            time_signature_num: 4,
            time_signature_den: 4,
            bars: 8,
            key_tonic: "C".into(),
            mode: Mode::Ionian,
            seed: 42,
        }
    }

    #[test]
    fn cascade_delete_removes_children() {
        let store = InMemoryStore::new();
        let project = store.insert_project(sample_project()).unwrap();
        let track = store
            .insert_track(Track {
                id: Uuid::new_v4(),
                project_id: project.id,
                name: "drums".into(),
                role: TrackRole::Drums,
                midi_channel: 9,
                midi_program: 0,
                is_muted: false,
                is_soloed: false,
                start_offset_ticks: 0,
            })
            .unwrap();
        let clip = store
            .insert_clip(Clip {
                id: Uuid::new_v4(),
                track_id: track.id,
                start_bar: 0,
                length_bars: 2,
                grid_mode: GridMode::Standard,
                polyrhythm_profile_id: None,
                drum_map_profile_id: None,
                is_muted: false,
                is_soloed: false,
                start_offset_ticks: 0,
                intensity: 1.0,
                params: Default::default(),
            })
            .unwrap();
        store
            .delete_then_insert_notes(
                clip.id,
                vec![Note {
                    id: Uuid::new_v4(),
                    clip_id: clip.id,
                    pitch: 60,
                    velocity: 100,
                    start_tick: 0,
                    duration_tick: 480,
                    probability: 1.0,
                }],
            )
            .unwrap();

        store.delete_project(project.id).unwrap();
        assert!(store.get_track(track.id).is_err());
        assert!(store.get_clip(clip.id).is_err());
        assert!(store.list_notes_by_clip(clip.id).is_empty());
    }

    #[test]
    fn locked_chord_event_rejects_mutation() {
        let store = InMemoryStore::new();
        let project = store.insert_project(sample_project()).unwrap();
        let track = store
            .insert_track(Track {
                id: Uuid::new_v4(),
                project_id: project.id,
                name: "chords".into(),
                role: TrackRole::Chords,
                midi_channel: 0,
                midi_program: 0,
                is_muted: false,
                is_soloed: false,
                start_offset_ticks: 0,
            })
            .unwrap();
        let clip = store
            .insert_clip(Clip {
                id: Uuid::new_v4(),
                track_id: track.id,
                start_bar: 0,
                length_bars: 1,
                grid_mode: GridMode::Standard,
                polyrhythm_profile_id: None,
                drum_map_profile_id: None,
                is_muted: false,
                is_soloed: false,
                start_offset_ticks: 0,
                intensity: 1.0,
                params: Default::default(),
            })
            .unwrap();
        use crate::{PatternType, StrumCurve, StrumDirection, VelocityCurve, Voicing};
        let event = ChordEvent {
            id: Uuid::new_v4(),
            clip_id: clip.id,
            start_tick: 0,
            duration_tick: 1920,
            duration_beats: 4.0,
            roman_numeral: "I".into(),
            chord_name: "C".into(),
            intensity: 1.0,
            voicing: Voicing::Root,
            inversion: 0,
            strum_beats: 0.0,
            humanize_beats: 0.0,
            offset_beats: 0.0,
            pattern_type: PatternType::Block,
            duration_gate: 0.85,
            velocity_curve: VelocityCurve::Flat,
            strum_direction: StrumDirection::Down,
            strum_spread: 1.0,
            strum_curve: StrumCurve::Linear,
            comp_pattern: None,
            hit_params: None,
            retrigger: true,
            velocity_jitter: 0,
            timing_jitter_ms: 0.0,
            is_enabled: true,
            is_locked: true,
            grid_quantum: None,
            strum_ms: None,
            humanize_ms: None,
        };
        store.delete_then_insert_chord_events(clip.id, vec![event.clone()]).unwrap();
        let mut mutated = event.clone();
        mutated.chord_name = "D".into();
        assert!(store.update_chord_event(mutated.clone(), false).is_err());
        mutated.is_locked = false;
        assert!(store.update_chord_event(mutated, true).is_ok());
    }

    #[test]
    fn bulk_regen_replaces_locked_chord_events() {
        let store = InMemoryStore::new();
        let project = store.insert_project(sample_project()).unwrap();
        let track = store
            .insert_track(Track {
                id: Uuid::new_v4(),
                project_id: project.id,
                name: "chords".into(),
                role: TrackRole::Chords,
                midi_channel: 0,
                midi_program: 0,
                is_muted: false,
                is_soloed: false,
                start_offset_ticks: 0,
            })
            .unwrap();
        let clip = store
            .insert_clip(Clip {
                id: Uuid::new_v4(),
                track_id: track.id,
                start_bar: 0,
                length_bars: 1,
                grid_mode: GridMode::Standard,
                polyrhythm_profile_id: None,
                drum_map_profile_id: None,
                is_muted: false,
                is_soloed: false,
                start_offset_ticks: 0,
                intensity: 1.0,
                params: Default::default(),
            })
            .unwrap();
        use crate::{PatternType, StrumCurve, StrumDirection, VelocityCurve, Voicing};
        let locked = ChordEvent {
            id: Uuid::new_v4(),
            clip_id: clip.id,
            start_tick: 0,
            duration_tick: 1920,
            duration_beats: 4.0,
            roman_numeral: "I".into(),
            chord_name: "C".into(),
            intensity: 1.0,
            voicing: Voicing::Root,
            inversion: 0,
            strum_beats: 0.0,
            humanize_beats: 0.0,
            offset_beats: 0.0,
            pattern_type: PatternType::Block,
            duration_gate: 0.85,
            velocity_curve: VelocityCurve::Flat,
            strum_direction: StrumDirection::Down,
            strum_spread: 1.0,
            strum_curve: StrumCurve::Linear,
            comp_pattern: None,
            hit_params: None,
            retrigger: true,
            velocity_jitter: 0,
            timing_jitter_ms: 0.0,
            is_enabled: true,
            is_locked: true,
            grid_quantum: None,
            strum_ms: None,
            humanize_ms: None,
        };
        store.delete_then_insert_chord_events(clip.id, vec![locked]).unwrap();

        let replacement = ChordEvent {
            id: Uuid::new_v4(),
            chord_name: "G".into(),
            roman_numeral: "V".into(),
            ..store.list_chord_events_by_clip(clip.id)[0].clone()
        };
        store.delete_then_insert_chord_events(clip.id, vec![replacement.clone()]).unwrap();

        let remaining = store.list_chord_events_by_clip(clip.id);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, replacement.id);
    }
}
