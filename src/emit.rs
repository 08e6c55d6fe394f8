//! Sorted `key=min/mean/max` output.
//!
//! Each number is written with Rust's `{:.1}` formatting: the exact binary
//! value is rounded to one fractional digit, and exact binary ties round
//! half to even (`0.25` prints `0.2`, `0.75` prints `0.8`).
//!
//! Values with at most one fractional digit are held as integer tenths,
//! which have no negative zero: `-0.0` in the input prints `0.0`. A
//! negative value that only rounds to zero keeps its sign, so `-0.04`
//! prints `-0.0`.

use std::io::{self, BufWriter, Write};

use crate::stats::Stats;
use crate::table::Table;

#[inline]
fn write_line<W: Write>(writer: &mut W, key: &[u8], stats: &Stats) -> io::Result<()> {
    writer.write_all(key)?;
    writeln!(
        writer,
        "={min:.1}/{mean:.1}/{max:.1}",
        min = stats.min(),
        mean = stats.mean(),
        max = stats.max()
    )
}

/// Consumes `table`, writing one line per key in ascending byte order.
pub fn emit<W: Write>(table: Table, writer: W) -> io::Result<()> {
    let mut writer = BufWriter::with_capacity(1 << 16, writer);

    for (key, stats) in table.into_sorted() {
        write_line(&mut writer, &key, &stats)?;
    }

    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::aggregate::aggregate;

    fn render(input: &str) -> String {
        let table = aggregate(input.as_bytes()).unwrap();
        let mut out = Vec::new();
        emit(table, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_two_stations() {
        assert_eq!(
            render("Tokyo;10.0\nTokyo;20.0\nParis;-5.5\n"),
            "Paris=-5.5/-5.5/-5.5\nTokyo=10.0/15.0/20.0\n"
        );
    }

    #[test]
    fn test_single_record() {
        assert_eq!(render("X;3.3\n"), "X=3.3/3.3/3.3\n");
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(render(""), "");
    }

    #[test]
    fn test_mean_is_rounded_to_one_digit() {
        assert_eq!(render("a;1.0\na;2.0\na;2.0\n"), "a=1.0/1.7/2.0\n");
        assert_eq!(render("b;-1.0\nb;-2.0\nb;-2.0\n"), "b=-2.0/-1.7/-1.0\n");
    }

    #[test]
    fn test_binary_ties_round_half_to_even() {
        assert_eq!(render("t;0.25\n"), "t=0.2/0.2/0.2\n");
        assert_eq!(render("t;0.75\n"), "t=0.8/0.8/0.8\n");
        assert_eq!(render("t;-0.25\n"), "t=-0.2/-0.2/-0.2\n");
        // Mean of 0.2 and 0.3 is the exact tie 0.25.
        assert_eq!(render("t;0.2\nt;0.3\n"), "t=0.2/0.2/0.3\n");
    }

    #[test]
    fn test_rounding_is_stable() {
        let input = "t;0.05\nt;1.15\nt;2.25\nu;-0.05\n";
        let first = render(input);
        for _ in 0..10 {
            assert_eq!(render(input), first);
        }
        assert_eq!(first, "t=0.1/1.1/2.2\nu=-0.1/-0.1/-0.1\n");
    }

    #[test]
    fn test_negative_zero() {
        assert_eq!(render("z;-0.0\n"), "z=0.0/0.0/0.0\n");
        assert_eq!(render("z;-0\n"), "z=0.0/0.0/0.0\n");
        assert_eq!(render("z;-0.04\n"), "z=-0.0/-0.0/-0.0\n");
        assert_eq!(render("z;-0.0\nz;-0.2\n"), "z=-0.2/-0.1/0.0\n");
    }

    #[test]
    fn test_keys_written_verbatim() {
        assert_eq!(
            render("São Paulo;25.1\nİzmir;18.0\nAbéché;29.4\n"),
            "Abéché=29.4/29.4/29.4\nSão Paulo=25.1/25.1/25.1\nİzmir=18.0/18.0/18.0\n"
        );
    }
}
