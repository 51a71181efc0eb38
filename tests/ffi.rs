use std::f64::consts::PI;
use std::ffi::{CStr, CString};
use std::io::Write;
use std::os::raw::c_char;
use std::path::Path;
use std::thread;

use hound::{SampleFormat, WavSpec, WavWriter};
use serde_json::Value;
use speech_pitch::{PitchAnalyzer, PitchAnalyzer2, PitchAnalyzerFree};

fn write_sine(path: &Path, freq: f64, secs: f64) {
    let spec = WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for i in 0..(16000. * secs) as usize {
        let x = 0.5 * (2. * PI * freq * i as f64 / 16000.).sin();
        writer.write_sample((x * i16::MAX as f64) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

fn c_path(path: &Path) -> CString {
    CString::new(path.to_str().unwrap()).unwrap()
}

fn analyze_owned(path: &CStr) -> Value {
    unsafe {
        let ptr = PitchAnalyzer2(path.as_ptr());
        assert!(!ptr.is_null());
        let json = CStr::from_ptr(ptr).to_str().unwrap().to_owned();
        PitchAnalyzerFree(ptr);
        serde_json::from_str(&json).unwrap()
    }
}

#[test]
fn test_buffer_variant_success() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a3.wav");
    write_sine(&path, 220., 0.5);

    let mut buf = vec![0 as c_char; 1024];
    let status = unsafe { PitchAnalyzer(c_path(&path).as_ptr(), buf.as_mut_ptr()) };
    assert_eq!(status, 0);

    let json = unsafe { CStr::from_ptr(buf.as_ptr()) }.to_str().unwrap();
    let value: Value = serde_json::from_str(json).unwrap();
    let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
    keys.sort();
    assert_eq!(
        keys,
        ["comment", "pitch1", "pitch2", "pitch3", "pitch4", "status"]
    );
    assert_eq!(value["status"], 0);
    assert_eq!(value["comment"], "success");
    assert!(value["pitch2"].as_f64().unwrap() >= 0.);
}

#[test]
fn test_buffer_variant_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut buf = vec![0 as c_char; 1024];
    let path = c_path(&dir.path().join("missing.wav"));
    let status = unsafe { PitchAnalyzer(path.as_ptr(), buf.as_mut_ptr()) };
    assert_eq!(status, 1000);

    let json = unsafe { CStr::from_ptr(buf.as_ptr()) }.to_str().unwrap();
    let value: Value = serde_json::from_str(json).unwrap();
    assert_eq!(value["status"], 1000);
    assert_eq!(value["comment"], "Error : file not found");
}

#[test]
fn test_buffer_variant_null_dst() {
    let path = CString::new("whatever.wav").unwrap();
    let status = unsafe { PitchAnalyzer(path.as_ptr(), std::ptr::null_mut()) };
    assert_eq!(status, libc::EINVAL);
}

#[test]
fn test_owned_variant_always_returns_json() {
    let dir = tempfile::tempdir().unwrap();

    let missing = analyze_owned(&c_path(&dir.path().join("missing.wav")));
    assert_eq!(missing["status"], 1000);

    let garbage_path = dir.path().join("garbage.wav");
    std::fs::File::create(&garbage_path)
        .unwrap()
        .write_all(b"this is not audio at all")
        .unwrap();
    let garbage = analyze_owned(&c_path(&garbage_path));
    assert_eq!(garbage["status"], 1002);
    assert_eq!(garbage["comment"], "Error : file is not on correct format");
    assert!(garbage.get("pitch1").is_none());

    let empty_path = dir.path().join("empty.wav");
    write_sine(&empty_path, 220., 0.);
    assert_eq!(analyze_owned(&c_path(&empty_path))["status"], 1002);

    let null = unsafe {
        let ptr = PitchAnalyzer2(std::ptr::null());
        let value: Value = serde_json::from_str(CStr::from_ptr(ptr).to_str().unwrap()).unwrap();
        PitchAnalyzerFree(ptr);
        value
    };
    assert_eq!(null["status"], 1000);
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_path_is_opened() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempfile::tempdir().unwrap();
    // Latin-1 "café.wav"
    let path = dir.path().join(OsStr::from_bytes(b"caf\xe9.wav"));
    write_sine(&path, 220., 0.5);
    assert!(path.exists());

    let c_path = CString::new(path.as_os_str().as_bytes()).unwrap();
    let value = analyze_owned(&c_path);
    assert_eq!(value["status"], 0, "{value}");
    assert_eq!(value["comment"], "success");
}

#[test]
fn test_concurrent_calls_do_not_mix() {
    let dir = tempfile::tempdir().unwrap();
    let low = dir.path().join("low.wav");
    let high = dir.path().join("high.wav");
    write_sine(&low, 150., 0.5);
    write_sine(&high, 400., 0.5);
    let missing = dir.path().join("missing.wav");

    let expected: Vec<Value> = [&low, &high, &missing]
        .iter()
        .map(|p| analyze_owned(&c_path(p)))
        .collect();

    let handles: Vec<_> = (0..4)
        .flat_map(|_| [low.clone(), high.clone(), missing.clone()])
        .map(|path| thread::spawn(move || analyze_owned(&c_path(&path))))
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), expected[i % 3]);
    }
    assert!(expected[0]["pitch1"].as_f64() < expected[1]["pitch1"].as_f64());
}
