use clap::{arg,crate_version,Command};
use retrozip::{huffman,lz77,lzss,lzw,lz77_huff,lzw_huff,bzip,gif};
use retrozip::STDRESULT;

const RCH: &str = "unreachable was reached";

const METHODS: [&str;9] = [
    "huffman","lz77","lzss","lzw-fixed","lzw-variable","lzw-gif","lz77-huff","lzw-huff","bzip"
];

fn ok_to_overwrite(path_out: &str) -> bool {
    if let Ok(_f) = std::fs::File::open(path_out) {
        let mut ans = String::new();
        eprint!("{} exists, overwrite? (y/n) ",path_out);
        if std::io::stdin().read_line(&mut ans).is_err() {
            return false;
        }
        if ans.trim_end()=="y" || ans.trim_end()=="Y" {
            log::warn!("existing file will be overwritten");
            return true;
        }
        return false;
    }
    true
}

fn compress(ibuf: &[u8],method: &str) -> Result<Vec<u8>,retrozip::Error> {
    match method {
        "huffman" => huffman::encode(ibuf,8)?.to_bytes(),
        "lz77" => lz77::encode(ibuf,&lz77::STD_OPTIONS),
        "lzss" => lzss::encode(ibuf,&lz77::STD_OPTIONS),
        "lzw-fixed" => lzw::encode(ibuf,&lzw::FIXED_OPTIONS),
        "lzw-variable" => lzw::encode(ibuf,&lzw::VARIABLE_OPTIONS),
        "lzw-gif" => lzw::encode(ibuf,&lzw::GIF_OPTIONS),
        "lz77-huff" => lz77_huff::encode(ibuf,&lz77::STD_OPTIONS)?.to_bytes(),
        "lzw-huff" => lzw_huff::encode(ibuf,&lzw_huff::STD_OPTIONS)?.to_bytes(),
        "bzip" => bzip::encode(ibuf,&bzip::STD_OPTIONS),
        _ => Err(retrozip::Error::InvalidOptions("unknown method"))
    }
}

fn expand(ibuf: &[u8],method: &str) -> Result<Vec<u8>,retrozip::Error> {
    match method {
        "huffman" => {
            let encoded = huffman::Encoded::from_bytes(ibuf)?;
            huffman::decode(&encoded.payload,encoded.symbol_count,&encoded.tree,8)
        },
        "lz77" => lz77::decode(ibuf,&lz77::STD_OPTIONS),
        "lzss" => lzss::decode(ibuf,&lz77::STD_OPTIONS),
        "lzw-fixed" => lzw::decode(ibuf,&lzw::FIXED_OPTIONS),
        "lzw-variable" => lzw::decode(ibuf,&lzw::VARIABLE_OPTIONS),
        "lzw-gif" => lzw::decode(ibuf,&lzw::GIF_OPTIONS),
        "lz77-huff" => lz77_huff::decode(&huffman::Encoded::from_bytes(ibuf)?,&lz77::STD_OPTIONS),
        "lzw-huff" => lzw_huff::decode(&huffman::Encoded::from_bytes(ibuf)?,&lzw_huff::STD_OPTIONS),
        "bzip" => bzip::decode(ibuf),
        _ => Err(retrozip::Error::InvalidOptions("unknown method"))
    }
}

fn report(verb: &str,in_size: usize,out_size: usize) {
    match in_size {
        0 => eprintln!("{} {} into {}",verb,in_size,out_size),
        _ => eprintln!("{} {} into {}, ratio {:.3}",verb,in_size,out_size,out_size as f64 / in_size as f64)
    }
}

fn main() -> STDRESULT
{
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let long_help =
"Examples:
---------
Compress:      `retrozip compress -m bzip -i my_expanded -o my_compressed`
Expand:        `retrozip expand -m bzip -i my_compressed -o my_expanded`
Inspect GIF:   `retrozip gif -i my_image.gif -o my_pixels`";

    let mut main_cmd = Command::new("retrozip")
        .about("Compress and expand with classical algorithms")
        .after_long_help(long_help)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(Command::new("compress")
        .arg(arg!(-m --method <METHOD> "compression algorithm").value_parser(METHODS)
            .required(true))
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .about("compress a file"));

    main_cmd = main_cmd.subcommand(Command::new("expand")
        .arg(arg!(-m --method <METHOD> "compression algorithm").value_parser(METHODS)
            .required(true))
        .arg(arg!(-i --input <PATH> "input path").required(true))
        .arg(arg!(-o --output <PATH> "output path").required(true))
        .about("expand a file"));

    main_cmd = main_cmd.subcommand(Command::new("gif")
        .arg(arg!(-i --input <PATH> "GIF file").required(true))
        .arg(arg!(-o --output <PATH> "write decoded pixels here").required(false))
        .about("decode a GIF file"));

    let matches = main_cmd.get_matches();

    if let Some(cmd) = matches.subcommand_matches("compress") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let method = cmd.get_one::<String>("method").expect(RCH);
        if !ok_to_overwrite(path_out) {
            eprintln!("abort operation");
            return Ok(());
        }
        let ibuf = std::fs::read(path_in)?;
        let obuf = compress(&ibuf,method)?;
        std::fs::write(path_out,&obuf)?;
        report("compressed",ibuf.len(),obuf.len());
    }

    if let Some(cmd) = matches.subcommand_matches("expand") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let method = cmd.get_one::<String>("method").expect(RCH);
        if !ok_to_overwrite(path_out) {
            eprintln!("abort operation");
            return Ok(());
        }
        let ibuf = std::fs::read(path_in)?;
        let obuf = expand(&ibuf,method)?;
        std::fs::write(path_out,&obuf)?;
        report("expanded",ibuf.len(),obuf.len());
    }

    if let Some(cmd) = matches.subcommand_matches("gif") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let image = gif::decode(&std::fs::read(path_in)?)?;
        println!("GIF{} {}x{}",image.version,image.screen.width,image.screen.height);
        println!("global palette: {}, {} bits per pixel",image.screen.has_palette,image.screen.bits_per_pixel);
        println!("palette colors: {}",image.palette.len() / 3);
        for (i,img) in image.images.iter().enumerate() {
            println!("image {}: {}x{} at ({},{}), interlaced: {}",i,img.width,img.height,img.left,img.top,img.interlaced);
        }
        println!("pixels: {}",image.pixels.len());
        if let Some(path_out) = cmd.get_one::<String>("output") {
            if !ok_to_overwrite(path_out) {
                eprintln!("abort operation");
                return Ok(());
            }
            std::fs::write(path_out,&image.pixels)?;
        }
    }

    Ok(())
}
