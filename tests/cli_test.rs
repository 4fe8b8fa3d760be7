use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*;
use std::path::Path;
use std::process::Command; // Run programs
use tempfile;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

const METHODS: [&str;9] = [
    "huffman","lz77","lzss","lzw-fixed","lzw-variable","lzw-gif","lz77-huff","lzw-huff","bzip"
];

/// 10x10 sample image with a 4 color global palette
const SAMPLE_GIF: &str = concat!(
    "474946383961","0A000A00910000",
    "FFFFFFFF00000000FF000000",
    "21F9040000000000",
    "2C000000000A000A0000",
    "02168C2D99872A1CDC33A00275EC95FAA8DE608C04914C0100",
    "3B"
);

fn sample_text() -> Vec<u8> {
    let mut ans = "I am Sam. Sam I am. I do not like this Sam I am.\r\n".repeat(40).into_bytes();
    ans.extend((0..=255u8).rev());
    ans
}

fn run(verb: &str,method: &str,in_path: &Path,out_path: &Path) -> STDRESULT {
    let mut cmd = Command::cargo_bin("retrozip")?;
    cmd.arg(verb)
        .arg("-m").arg(method)
        .arg("-i").arg(in_path)
        .arg("-o").arg(out_path)
        .assert()
        .success()
        .stderr(predicate::str::contains(verb));
    Ok(())
}

fn round_trip_test(method: &str) -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("sample.txt");
    let cmp_path = temp_dir.path().join("sample.cmp");
    let out_path = temp_dir.path().join("expanded.txt");
    std::fs::write(&in_path,sample_text())?;
    run("compress",method,&in_path,&cmp_path)?;
    run("expand",method,&cmp_path,&out_path)?;
    match (std::fs::read(in_path),std::fs::read(out_path)) {
        (Ok(v1),Ok(v2)) => {
            assert_eq!(v1,v2);
        },
        _ => panic!("unable to compare output with reference")
    }
    Ok(())
}

#[test]
fn all_methods_round_trip() -> STDRESULT {
    for method in METHODS {
        round_trip_test(method)?;
    }
    Ok(())
}

#[test]
fn bzip_compresses_text() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("sample.txt");
    let cmp_path = temp_dir.path().join("sample.bz");
    std::fs::write(&in_path,"I am Sam. Sam I am. I do not like this Sam I am.\r\n".repeat(40))?;
    run("compress","bzip",&in_path,&cmp_path)?;
    assert!(std::fs::metadata(&cmp_path)?.len() < std::fs::metadata(&in_path)?.len() / 2);
    Ok(())
}

#[test]
fn unknown_method() -> STDRESULT {
    let mut cmd = Command::cargo_bin("retrozip")?;
    cmd.arg("compress")
        .arg("-m").arg("lzh")
        .arg("-i").arg("in")
        .arg("-o").arg("out")
        .assert()
        .failure();
    Ok(())
}

#[test]
fn inspect_gif() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("sample.gif");
    let out_path = temp_dir.path().join("sample.pix");
    std::fs::write(&in_path,hex::decode(SAMPLE_GIF)?)?;
    let mut cmd = Command::cargo_bin("retrozip")?;
    cmd.arg("gif")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&out_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("GIF89a 10x10"))
        .stdout(predicate::str::contains("pixels: 100"));
    let pixels = std::fs::read(&out_path)?;
    assert_eq!(pixels.len(),100);
    assert_eq!(pixels[0..10],[1,1,1,1,1,2,2,2,2,2]);
    Ok(())
}

#[test]
fn bad_gif() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("sample.gif");
    std::fs::write(&in_path,b"not a gif")?;
    let mut cmd = Command::cargo_bin("retrozip")?;
    cmd.arg("gif")
        .arg("-i").arg(&in_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("BadSignature"));
    Ok(())
}

#[test]
fn overwrites_when_confirmed() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("sample.txt");
    let out_path = temp_dir.path().join("sample.cmp");
    std::fs::write(&in_path,sample_text())?;
    std::fs::write(&out_path,b"replace me")?;
    let mut cmd = assert_cmd::Command::cargo_bin("retrozip")?;
    cmd.arg("compress")
        .arg("-m").arg("lzss")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&out_path)
        .write_stdin("y\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("will be overwritten"));
    assert_ne!(std::fs::read(&out_path)?,b"replace me".to_vec());
    Ok(())
}

#[test]
fn refuses_to_overwrite() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("sample.txt");
    let out_path = temp_dir.path().join("sample.cmp");
    std::fs::write(&in_path,sample_text())?;
    std::fs::write(&out_path,b"keep me")?;
    let mut cmd = assert_cmd::Command::cargo_bin("retrozip")?;
    cmd.arg("compress")
        .arg("-m").arg("lzss")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&out_path)
        .write_stdin("n\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("abort operation"));
    assert_eq!(std::fs::read(&out_path)?,b"keep me".to_vec());
    Ok(())
}
