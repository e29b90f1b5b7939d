use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*;
use std::path::Path;
use std::process::Command; // Run programs
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

const HEADER_SIZE: usize = 1024;

fn sample_text() -> Vec<u8> {
    let line = "I am Sam. Sam I am. I do not like this Sam I am.\r\n";
    line.repeat(40).into_bytes()
}

fn compress_file(in_path: &Path,out_path: &Path) -> STDRESULT {
    let mut cmd = Command::cargo_bin("huffcompressor")?;
    cmd.arg("compress")
        .arg("-i").arg(in_path)
        .arg("-o").arg(out_path)
        .assert()
        .success()
        .stderr(predicate::str::contains("compressed"));
    Ok(())
}

fn expand_file(in_path: &Path,out_path: &Path) -> STDRESULT {
    let mut cmd = Command::cargo_bin("huffcompressor")?;
    cmd.arg("expand")
        .arg("-i").arg(in_path)
        .arg("-o").arg(out_path)
        .assert()
        .success()
        .stderr(predicate::str::contains("expanded"));
    Ok(())
}

fn round_trip_test(dat: &[u8]) -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("original.bin");
    let cmp_path = temp_dir.path().join("original.huf");
    let out_path = temp_dir.path().join("expanded.bin");
    std::fs::write(&in_path,dat)?;
    compress_file(&in_path,&cmp_path)?;
    expand_file(&cmp_path,&out_path)?;
    match (std::fs::read(&cmp_path),std::fs::read(&out_path)) {
        (Ok(compressed),Ok(expanded)) => {
            assert!(compressed.len() >= HEADER_SIZE);
            assert_eq!(expanded,dat.to_vec());
        },
        _ => panic!("unable to compare output with reference")
    }
    Ok(())
}

#[test]
fn text_round_trip() -> STDRESULT {
    round_trip_test(&sample_text())
}

#[test]
fn empty_round_trip() -> STDRESULT {
    round_trip_test(&[])
}

#[test]
fn single_byte_round_trip() -> STDRESULT {
    round_trip_test(&[0x41;1000])
}

#[test]
fn compression_report() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("sam.txt");
    let out_path = temp_dir.path().join("sam.huf");
    std::fs::write(&in_path,sample_text())?;
    let mut cmd = Command::cargo_bin("huffcompressor")?;
    cmd.arg("compress")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&out_path)
        .assert()
        .success()
        .stderr(predicate::str::is_match(r"compressed 2000 into \d+ \(\d+\.\d\d%\)")?);
    Ok(())
}

#[test]
fn code_listing() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("letters.txt");
    std::fs::write(&in_path,"aaaabbbccd")?;
    let mut cmd = Command::cargo_bin("huffcompressor")?;
    cmd.arg("codes")
        .arg("-i").arg(&in_path)
        .assert()
        .success()
        .stdout("61          4 0\n62          3 10\n63          2 111\n64          1 110\n");
    Ok(())
}

#[test]
fn corrupt_input_leaves_no_output() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("sam.txt");
    let cmp_path = temp_dir.path().join("sam.huf");
    let out_path = temp_dir.path().join("sam_expanded.txt");
    std::fs::write(&in_path,sample_text())?;
    compress_file(&in_path,&cmp_path)?;
    let compressed = std::fs::read(&cmp_path)?;
    let damaged = &compressed[0..HEADER_SIZE + (compressed.len() - HEADER_SIZE)/2];
    std::fs::write(&cmp_path,damaged)?;
    let mut cmd = Command::cargo_bin("huffcompressor")?;
    cmd.arg("expand")
        .arg("-i").arg(&cmp_path)
        .arg("-o").arg(&out_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("TruncatedPayload"));
    assert!(!out_path.exists());
    // only the input and the damaged file remain, the scratch file is gone
    assert_eq!(std::fs::read_dir(temp_dir.path())?.count(),2);
    Ok(())
}

#[test]
fn output_permissions() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("sam.txt");
    let cmp_path = temp_dir.path().join("sam.huf");
    let out_path = temp_dir.path().join("sam_expanded.txt");
    let reference_path = temp_dir.path().join("reference.txt");
    std::fs::write(&in_path,sample_text())?;
    std::fs::write(&reference_path,"reference")?;
    compress_file(&in_path,&cmp_path)?;
    expand_file(&cmp_path,&out_path)?;
    let reference = std::fs::metadata(&reference_path)?.permissions();
    assert_eq!(std::fs::metadata(&cmp_path)?.permissions(),reference);
    assert_eq!(std::fs::metadata(&out_path)?.permissions(),reference);
    Ok(())
}

#[cfg(unix)]
#[test]
fn output_mode_follows_input() -> STDRESULT {
    use std::os::unix::fs::PermissionsExt;
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("sam.txt");
    let cmp_path = temp_dir.path().join("sam.huf");
    std::fs::write(&in_path,sample_text())?;
    std::fs::set_permissions(&in_path,std::fs::Permissions::from_mode(0o644))?;
    compress_file(&in_path,&cmp_path)?;
    assert_eq!(std::fs::metadata(&cmp_path)?.permissions().mode() & 0o777,0o644);
    Ok(())
}

#[test]
fn missing_input() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("nothing_here.txt");
    let out_path = temp_dir.path().join("nothing_here.huf");
    let mut cmd = Command::cargo_bin("huffcompressor")?;
    cmd.arg("compress")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&out_path)
        .assert()
        .failure();
    assert!(!out_path.exists());
    Ok(())
}
