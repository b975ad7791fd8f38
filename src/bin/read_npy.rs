use cfd_visual::{ArrayLoader, ColorScale, NpyLoader};
use std::{env, fs::File, io::BufReader, path::Path};

fn main() -> anyhow::Result<()> {
    for arg in env::args().skip(1) {
        let path = Path::new(&arg);
        let header = npyz::NpyFile::new(BufReader::new(File::open(path)?))?;
        println!(
            "{:?} : {:?} {:?} {:?}",
            path,
            header.shape(),
            header.dtype(),
            header.order()
        );
        let volume = NpyLoader.load(path)?;
        let scale = ColorScale::from_volume(&volume);
        match volume.finite_range() {
            Some((lo, hi)) => print!("  values [{lo}, {hi}]"),
            None => print!("  no finite values"),
        }
        println!(" -> color scale [{}, {}]", scale.min, scale.max);
    }
    Ok(())
}
