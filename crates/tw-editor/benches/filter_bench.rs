//! Filter throughput over a one-second 16-bit sample.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tw_editor::tw_ir::{BitDepth, PcmWrite, SampleKey};
use tw_editor::{Clipboard, EditorConfig, Interpolation, NullListener, SampleBank, SampleEditor, SampleModule};

const FRAMES: u32 = 44100;

fn setup() -> (SampleEditor, SampleBank, SampleKey) {
    let mut bank = SampleBank::new();
    let key = bank
        .create_sample("bench", FRAMES, BitDepth::Sixteen)
        .expect("sample memory");
    let sample = bank.sample_mut(key).expect("sample");
    for i in 0..FRAMES as usize {
        let phase = i as f32 * 440.0 * std::f32::consts::TAU / FRAMES as f32;
        sample.set_float(i, phase.sin() * 0.5);
    }
    let config = EditorConfig {
        undo_enabled: false,
        ..EditorConfig::default()
    };
    let mut editor = SampleEditor::new(config, Clipboard::shared(), NullListener);
    editor.attach(&mut bank, key);
    (editor, bank, key)
}

fn bench_filters(c: &mut Criterion) {
    let (mut editor, mut bank, _) = setup();

    c.bench_function("normalize_1s", |b| {
        b.iter(|| editor.normalize(&mut bank, black_box(0.9)))
    });
    c.bench_function("reverse_1s", |b| b.iter(|| editor.reverse(&mut bank)));
    c.bench_function("smooth_triangular_1s", |b| {
        b.iter(|| editor.smooth_triangular(&mut bank))
    });
    c.bench_function("equalize_10_band_1s", |b| {
        let gains = [3.0, 2.0, 0.0, -2.0, -4.0, -2.0, 0.0, 2.0, 3.0, 1.0];
        b.iter(|| editor.equalize(&mut bank, black_box(&gains)))
    });
}

fn bench_undo(c: &mut Criterion) {
    let (mut editor, mut bank, _) = setup();
    editor.enable_undo(true);

    c.bench_function("dc_offset_with_undo_1s", |b| {
        b.iter(|| {
            editor.dc_offset(&mut bank, black_box(0.001)).ok();
            editor.undo(&mut bank).ok();
        })
    });
}

fn bench_resample(c: &mut Criterion) {
    c.bench_function("resample_cubic_1s", |b| {
        b.iter_batched(
            setup,
            |(mut editor, mut bank, _)| editor.resample(&mut bank, black_box(22050.0), Interpolation::Cubic),
            criterion::BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, bench_filters, bench_undo, bench_resample);
criterion_main!(benches);
