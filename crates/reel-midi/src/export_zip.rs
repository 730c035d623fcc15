//! Split-by-track or split-by-clip ZIP export.
//!
//! Grounded on `midi/export_zip.py`'s `export_project_to_zip`: one SMF per
//! part, named `part_{index:02}_{name}.mid`, written into a deflate-
//! compressed archive in memory.

use std::io::{Cursor, Write};

use reel_engine::playback_filter::filter_for_playback;
use reel_model::{Clip, Note, Project, Track};
use zip::write::FileOptions;
use zip::ZipWriter;

use crate::export::{export_project_to_midi, flatten_track};
use crate::sanitize::sanitize_filename;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitBy {
    Track,
    Clip,
}

/// Builds a ZIP archive with one MIDI file per track (or per clip, per
/// `split_by`), applying mute/solo filtering first exactly as the
/// single-file export does.
pub fn export_project_to_zip(
    project: &Project,
    tracks: &[Track],
    clips: &[Clip],
    notes_by_clip: impl Fn(&Clip) -> Vec<Note>,
    split_by: SplitBy,
) -> Result<Vec<u8>> {
    let playable_tracks = filter_for_playback(tracks.to_vec());

    let mut buf = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(&mut buf);
    let options: FileOptions = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut part_index = 0u32;
    match split_by {
        SplitBy::Track => {
            for track in &playable_tracks {
                part_index += 1;
                let export = flatten_track(project, track, clips, &notes_by_clip);
                let bytes = export_project_to_midi(std::slice::from_ref(&export))?;
                let filename = format!("part_{:02}_{}.mid", part_index, sanitize_filename(&track.name));
                zip.start_file(filename, options)?;
                zip.write_all(&bytes)?;
            }
        }
        SplitBy::Clip => {
            for track in &playable_tracks {
                let this_track_clips: Vec<Clip> =
                    clips.iter().filter(|c| c.track_id == track.id).cloned().collect();
                for clip in filter_for_playback(this_track_clips) {
                    part_index += 1;
                    let export = flatten_track(project, track, std::slice::from_ref(&clip), &notes_by_clip);
                    let bytes = export_project_to_midi(std::slice::from_ref(&export))?;
                    let filename = format!(
                        "part_{:02}_{}_{}.mid",
                        part_index,
                        sanitize_filename(&track.name),
                        sanitize_filename(&format!("bar_{}", clip.start_bar)),
                    );
                    zip.start_file(filename, options)?;
                    zip.write_all(&bytes)?;
                }
            }
        }
    }
    zip.finish()?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_model::{ClipParams, GridMode, TrackRole};

    fn sample_project() -> Project {
        Project {
            id: uuid::Uuid::new_v4(),
            name: "demo".into(),
            bpm: 120,
            time_signature_num: 4,
            time_signature_den: 4,
            bars: 2,
            key_tonic: "C".into(),
            mode: reel_model::Mode::Ionian,
            seed: 1,
        }
    }

    fn sample_track(project: &Project, name: &str) -> Track {
        Track {
            id: uuid::Uuid::new_v4(),
            project_id: project.id,
            name: name.into(),
            role: TrackRole::Melody,
            midi_channel: 0,
            midi_program: 0,
            is_muted: false,
            is_soloed: false,
            start_offset_ticks: 0,
        }
    }

    fn sample_clip(track: &Track, start_bar: u32) -> Clip {
        Clip {
            id: uuid::Uuid::new_v4(),
            track_id: track.id,
            start_bar,
            length_bars: 1,
            grid_mode: GridMode::Standard,
            polyrhythm_profile_id: None,
            drum_map_profile_id: None,
            is_muted: false,
            is_soloed: false,
            start_offset_ticks: 0,
            intensity: 1.0,
            params: ClipParams::default(),
        }
    }

    #[test]
    fn split_by_track_produces_one_entry_per_track() {
        let project = sample_project();
        let t1 = sample_track(&project, "lead");
        let t2 = sample_track(&project, "pad");
        let c1 = sample_clip(&t1, 0);
        let c2 = sample_clip(&t2, 0);
        let clips = vec![c1.clone(), c2.clone()];
        let note = |clip_id: uuid::Uuid| Note {
            id: uuid::Uuid::new_v4(),
            clip_id,
            pitch: 60,
            velocity: 100,
            start_tick: 0,
            duration_tick: 240,
            probability: 1.0,
        };
        let bytes = export_project_to_zip(
            &project,
            &[t1, t2],
            &clips,
            |c| vec![note(c.id)],
            SplitBy::Track,
        )
        .unwrap();

        let cursor = Cursor::new(bytes);
        let archive = zip::ZipArchive::new(cursor).unwrap();
        assert_eq!(archive.len(), 2);
    }

    #[test]
    fn filenames_are_sanitized_and_indexed() {
        let project = sample_project();
        let track = sample_track(&project, "lead/pad:1");
        let clip = sample_clip(&track, 0);
        let bytes = export_project_to_zip(
            &project,
            &[track],
            &[clip],
            |_| Vec::new(),
            SplitBy::Track,
        )
        .unwrap();
        let cursor = Cursor::new(bytes);
        let mut archive = zip::ZipArchive::new(cursor).unwrap();
        let entry = archive.by_index(0).unwrap();
        assert_eq!(entry.name(), "part_01_lead_pad_1.mid");
    }
}
