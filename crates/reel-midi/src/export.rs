//! Project-to-SMF export.
//!
//! Grounded on `midi/export.py`'s `export_project_to_midi` /
//! `export_track_to_midi`: one track per `reel_model::Track`, a program
//! change as the first event, notes flattened to absolute ticks across
//! every clip the track owns, and note-off events carrying velocity 0.

use std::io::Write;

use midly::{Format, Header, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind};
use midly::num::{u15, u28, u4, u7};

use reel_engine::playback_filter::filter_for_playback;
use reel_engine::timebase::{absolute_tick, clip_start_tick, PPQ};
use reel_model::{Clip, Note, Project, Track as ModelTrack};

use crate::{MidiError, Result};

/// A note already resolved to an absolute tick within the project timeline.
#[derive(Debug, Clone, Copy)]
pub struct AbsoluteNote {
    pub start_tick: u32,
    pub duration_tick: u32,
    pub pitch: u8,
    pub velocity: u8,
}

/// A single track's worth of material, ready to be written as one SMF
/// track or as one split-export file.
#[derive(Debug, Clone)]
pub struct TrackExport {
    pub name: String,
    pub channel: u8,
    pub program: u8,
    pub notes: Vec<AbsoluteNote>,
}

/// Flattens one track's clips and notes into absolute-tick `AbsoluteNote`s,
/// per `export.py`'s `bar_index * ticks_per_bar + note.start_tick +
/// clip.start_offset_ticks + track.start_offset_ticks`. Clips are resolved
/// for mute/solo before flattening; the track itself is not — callers
/// filter the track list once up front via `export_project`.
pub fn flatten_track(
    project: &Project,
    track: &ModelTrack,
    clips: &[Clip],
    notes_by_clip: impl Fn(&Clip) -> Vec<Note>,
) -> TrackExport {
    let this_track_clips: Vec<Clip> = clips.iter().filter(|c| c.track_id == track.id).cloned().collect();
    let playable_clips = filter_for_playback(this_track_clips);
    let mut notes = Vec::new();
    for clip in &playable_clips {
        let bar_start = clip_start_tick(clip.start_bar, project.time_signature_num, project.time_signature_den);
        for note in notes_by_clip(clip) {
            let abs = absolute_tick(bar_start, note.start_tick, clip.start_offset_ticks, track.start_offset_ticks);
            notes.push(AbsoluteNote {
                start_tick: abs.max(0) as u32,
                // `export.py` clamps any duration below one tick up to one,
                // so a heavily humanized note never collapses to nothing.
                duration_tick: note.duration_tick.max(1) as u32,
                pitch: note.pitch,
                velocity: note.velocity,
            });
        }
    }
    notes.sort_by_key(|n| n.start_tick);
    TrackExport {
        name: track.name.clone(),
        channel: track.midi_channel,
        program: track.midi_program,
        notes,
    }
}

/// Filters `tracks` for mute/solo, flattens each to a `TrackExport`, and
/// encodes the whole project as one Format-1 SMF.
pub fn export_project(
    project: &Project,
    tracks: &[ModelTrack],
    clips: &[Clip],
    notes_by_clip: impl Fn(&Clip) -> Vec<Note>,
) -> Result<Vec<u8>> {
    let playable_tracks = filter_for_playback(tracks.to_vec());
    let exports: Vec<TrackExport> = playable_tracks
        .iter()
        .map(|t| flatten_track(project, t, clips, &notes_by_clip))
        .collect();
    export_project_to_midi(&exports)
}

fn build_events(track: &TrackExport) -> Result<Vec<TrackEvent<'static>>> {
    if track.channel > 15 {
        return Err(MidiError::Encode(format!("channel {} out of range", track.channel)));
    }
    if track.program > 127 {
        return Err(MidiError::Encode(format!("program {} out of range", track.program)));
    }
    let channel: u4 = track.channel.into();
    let program: u7 = track.program.into();

    // (absolute_tick, is_note_on, pitch, velocity); note-offs are ordered
    // before note-ons landing on the same tick so overlapping notes of the
    // same pitch never emit on/on or off/off back to back.
    let mut raw: Vec<(u32, bool, u8, u8)> = Vec::with_capacity(track.notes.len() * 2);
    for note in &track.notes {
        raw.push((note.start_tick, true, note.pitch, note.velocity));
        raw.push((note.start_tick + note.duration_tick, false, note.pitch, 0));
    }
    raw.sort_by_key(|(tick, is_on, ..)| (*tick, *is_on));

    let mut events = Vec::with_capacity(raw.len() + 2);
    events.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Midi {
            channel,
            message: MidiMessage::ProgramChange { program },
        },
    });

    let mut prev_tick = 0u32;
    for (tick, is_on, pitch, velocity) in raw {
        let delta = tick.saturating_sub(prev_tick);
        prev_tick = tick;
        if pitch > 127 {
            return Err(MidiError::Encode(format!("pitch {pitch} out of range")));
        }
        let pitch: u7 = pitch.into();
        let velocity: u7 = velocity.into();
        let message = if is_on {
            MidiMessage::NoteOn { key: pitch, vel: velocity }
        } else {
            MidiMessage::NoteOff { key: pitch, vel: velocity }
        };
        events.push(TrackEvent {
            delta: u28::new(delta),
            kind: TrackEventKind::Midi { channel, message },
        });
    }
    events.push(TrackEvent { delta: u28::new(0), kind: TrackEventKind::Meta(midly::MetaMessage::EndOfTrack) });
    Ok(events)
}

/// Writes a Format-1 SMF at `PPQ` ticks per quarter note for the given
/// tracks, returning the encoded bytes.
pub fn export_project_to_midi(tracks: &[TrackExport]) -> Result<Vec<u8>> {
    let header = Header {
        format: Format::Parallel,
        timing: Timing::Metrical(u15::new(PPQ as u16)),
    };
    let mut smf_tracks: Vec<Track<'static>> = Vec::with_capacity(tracks.len());
    for t in tracks {
        smf_tracks.push(build_events(t)?);
    }
    let smf = Smf { header, tracks: smf_tracks };
    let mut buf = Vec::new();
    smf.write(&mut buf).map_err(|e| MidiError::Encode(e.to_string()))?;
    Ok(buf)
}

/// Writes `bytes` straight through; kept separate from encoding so callers
/// streaming to a file handle don't need to buffer twice.
pub fn write_to<W: Write>(mut out: W, bytes: &[u8]) -> Result<()> {
    out.write_all(bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn note(start: u32, dur: u32, pitch: u8, vel: u8) -> AbsoluteNote {
        AbsoluteNote { start_tick: start, duration_tick: dur, pitch, velocity: vel }
    }

    #[test]
    fn round_trips_through_midly_parse() {
        let track = TrackExport {
            name: "chords".into(),
            channel: 0,
            program: 4,
            notes: vec![note(0, 480, 60, 100), note(480, 480, 64, 90)],
        };
        let bytes = export_project_to_midi(&[track]).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.header.format, Format::Parallel);
        assert_eq!(smf.tracks.len(), 1);

        let note_ons = smf.tracks[0]
            .iter()
            .filter(|ev| matches!(ev.kind, TrackEventKind::Midi { message: MidiMessage::NoteOn { .. }, .. }))
            .count();
        assert_eq!(note_ons, 2);
    }

    #[test]
    fn program_change_is_first_event() {
        let track = TrackExport { name: "bass".into(), channel: 1, program: 33, notes: vec![note(0, 240, 40, 110)] };
        let bytes = export_project_to_midi(&[track]).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        assert!(matches!(
            smf.tracks[0][0].kind,
            TrackEventKind::Midi { message: MidiMessage::ProgramChange { .. }, .. }
        ));
    }

    #[test]
    fn zero_duration_notes_are_clamped_to_one_tick() {
        let project = Project {
            id: uuid::Uuid::new_v4(),
            name: "p".into(),
            bpm: 120,
            time_signature_num: 4,
            time_signature_den: 4,
            bars: 4,
            key_tonic: "C".into(),
            mode: reel_model::Mode::Ionian,
            seed: 1,
        };
        let track = ModelTrack {
            id: uuid::Uuid::new_v4(),
            project_id: project.id,
            name: "melody".into(),
            role: reel_model::TrackRole::Melody,
            midi_channel: 0,
            midi_program: 0,
            is_muted: false,
            is_soloed: false,
            start_offset_ticks: 0,
        };
        let clip = Clip {
            id: uuid::Uuid::new_v4(),
            track_id: track.id,
            start_bar: 0,
            length_bars: 1,
            grid_mode: reel_model::GridMode::Standard,
            polyrhythm_profile_id: None,
            drum_map_profile_id: None,
            is_muted: false,
            is_soloed: false,
            start_offset_ticks: 0,
            intensity: 1.0,
            params: reel_model::ClipParams::default(),
        };
        let n = Note {
            id: uuid::Uuid::new_v4(),
            clip_id: clip.id,
            pitch: 60,
            velocity: 100,
            start_tick: 0,
            duration_tick: 1,
            probability: 1.0,
        };
        let export = flatten_track(&project, &track, &[clip], |_| vec![n.clone()]);
        assert_eq!(export.notes[0].duration_tick, 1);
    }
}
