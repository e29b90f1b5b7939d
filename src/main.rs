use clap::{arg,crate_version,Command};
use huffcompressor::{huff,STD_OPTIONS};
use std::path::Path;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

const RCH: &str = "unreachable was reached";

fn ok_to_overwrite(path_out: &str) -> bool {
    if let Ok(_f) = std::fs::File::open(path_out) {
        let mut ans = String::new();
        eprint!("{} exists, overwrite? (y/n) ",path_out);
        std::io::stdin().read_line(&mut ans).expect("could not read stdin");
        if ans.trim_end()=="y" || ans.trim_end()=="Y" {
            return true;
        }
        return false;
    }
    true
}

/// Scratch file next to `path_out`, so that it can be renamed into place.
/// It is deleted when dropped unless persisted.
fn scratch_file(path_out: &str) -> Result<tempfile::NamedTempFile,std::io::Error> {
    let dir = match Path::new(path_out).parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::path::PathBuf::from(".")
    };
    tempfile::NamedTempFile::new_in(dir)
}

/// Move the scratch file into place.  Scratch files are created owner-only,
/// so the output first takes on the permissions of the input file.
fn persist_like(out_file: tempfile::NamedTempFile,path_out: &str,in_file: &std::fs::File) -> STDRESULT {
    std::fs::set_permissions(out_file.path(),in_file.metadata()?.permissions())?;
    out_file.persist(path_out)?;
    Ok(())
}

fn main() -> STDRESULT
{
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let long_help =
"Examples:
---------
Compress:      `huffcompressor compress -i my_expanded -o my_compressed`
Expand:        `huffcompressor expand -i my_compressed -o my_expanded`
Show codes:    `huffcompressor codes -i my_expanded`";

    let mut main_cmd = Command::new("huffcompressor")
        .about("Compress and expand with static Huffman codes")
        .after_long_help(long_help)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(Command::new("compress")
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .about("compress a file"));

    main_cmd = main_cmd.subcommand(Command::new("expand")
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .about("expand a file"));

    main_cmd = main_cmd.subcommand(Command::new("codes")
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .about("print the count and code of each byte value in a file"));

    let matches = main_cmd.get_matches();

    if let Some(cmd) = matches.subcommand_matches("compress") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        if !ok_to_overwrite(path_out) {
            eprintln!("abort operation");
            return Ok(());
        }
        let mut in_file = std::fs::File::open(path_in)?;
        let mut out_file = scratch_file(path_out)?;
        let (in_size,out_size) = huff::compress(&mut in_file,out_file.as_file_mut(),&STD_OPTIONS)?;
        persist_like(out_file,path_out,&in_file)?;
        let ratio = match in_size {
            0 => 0.0,
            n => 100.0 * out_size as f64 / n as f64
        };
        eprintln!("compressed {} into {} ({:.2}%)",in_size,out_size,ratio);
    }

    if let Some(cmd) = matches.subcommand_matches("expand") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        if !ok_to_overwrite(path_out) {
            eprintln!("abort operation");
            return Ok(());
        }
        let mut in_file = std::fs::File::open(path_in)?;
        let mut out_file = scratch_file(path_out)?;
        let (in_size,out_size) = huff::expand(&mut in_file,out_file.as_file_mut(),&STD_OPTIONS)?;
        persist_like(out_file,path_out,&in_file)?;
        eprintln!("expanded {} into {}",in_size,out_size);
    }

    if let Some(cmd) = matches.subcommand_matches("codes") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let mut in_file = std::io::BufReader::new(std::fs::File::open(path_in)?);
        for line in huff::code_report(&mut in_file)? {
            println!("{}",line);
        }
    }

    Ok(())
}
