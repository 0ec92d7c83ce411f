use criterion::{Criterion, criterion_group, criterion_main};
use libtreedelta::memory::{MemoryDirectory, MemoryFile};
use libtreedelta::prelude::*;
use libtreedelta::{Ancestor, DiffOptions, Dirent, Result, Window, diff};
use std::hint::black_box;

/// An editor that swallows the stream; the benches measure the engine.
struct NullEditor;
struct NullSink;

impl DeltaSink for NullSink {
    fn window(&mut self, window: &Window) -> Result<()> {
        black_box(window.target_len);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl Editor for NullEditor {
    type Dir = ();
    type File = ();
    type Sink = NullSink;

    fn replace_root(&mut self, _: Option<Ancestor<'_>>) -> Result<()> {
        Ok(())
    }
    fn replace_directory(&mut self, _: &mut (), _: &str, _: Option<Ancestor<'_>>) -> Result<()> {
        Ok(())
    }
    fn replace_file(&mut self, _: &mut (), _: &str, _: Option<Ancestor<'_>>) -> Result<()> {
        Ok(())
    }
    fn add_directory(&mut self, _: &mut (), _: &str) -> Result<()> {
        Ok(())
    }
    fn add_file(&mut self, _: &mut (), _: &str) -> Result<()> {
        Ok(())
    }
    fn delete(&mut self, _: &mut (), _: &str) -> Result<()> {
        Ok(())
    }
    fn change_dir_prop(&mut self, _: &mut (), _: &str, _: Option<&[u8]>) -> Result<()> {
        Ok(())
    }
    fn change_entry_prop(&mut self, _: &mut (), _: &str, _: &str, _: Option<&[u8]>) -> Result<()> {
        Ok(())
    }
    fn change_file_prop(&mut self, _: &mut (), _: &str, _: Option<&[u8]>) -> Result<()> {
        Ok(())
    }
    fn apply_text_delta(&mut self, _: &mut ()) -> Result<NullSink> {
        Ok(NullSink)
    }
    fn close_directory(&mut self, _: ()) -> Result<()> {
        Ok(())
    }
    fn close_file(&mut self, _: ()) -> Result<()> {
        Ok(())
    }
}

fn wide_tree(base: u64, version: u64, salt: u8) -> MemoryDirectory {
    let mut root = MemoryDirectory::new([base], version);
    for d in 0..16u64 {
        let mut dir = MemoryDirectory::new([base, d, u64::from(salt)], version);
        for f in 0..16u64 {
            let body = vec![(f as u8).wrapping_add(salt); 512];
            dir.insert(
                format!("file-{f:02}"),
                MemoryFile::new([base, d, f, u64::from(salt)], version, body),
            );
        }
        root.insert(format!("dir-{d:02}"), dir);
    }
    root
}

fn bench_diff(c: &mut Criterion) {
    let source = wide_tree(1, 1, 0);
    let target = wide_tree(1, 2, 1);
    c.bench_function("diff_wide_tree", |b| {
        b.iter(|| diff(&source, &target, &mut NullEditor, DiffOptions::new()).unwrap())
    });
}

fn bench_canonicalize(c: &mut Criterion) {
    c.bench_function("canonicalize_dirent", |b| {
        b.iter(|| black_box(Dirent::from("/a/./b//c/../d/some/longer/path/")))
    });
}

criterion_group!(benches, bench_diff, bench_canonicalize);
criterion_main!(benches);
