//! Output and progress-reporting conveniences shared by the driver binaries.

use ndarray as nd;

/// Call `print!` and immediately flush.
#[macro_export]
macro_rules! print_flush {
    ( $fmt:literal $(, $val:expr )* $(,)?) => {
        print!($fmt $(, $val )*);
        std::io::Write::flush(&mut std::io::stdout()).unwrap();
    }
}

/// Call `println!` and immediately flush.
#[macro_export]
macro_rules! println_flush {
    ( $fmt:literal $(, $val:expr )* $(,)?) => {
        println!($fmt $(, $val )*);
        std::io::Write::flush(&mut std::io::stdout()).unwrap();
    }
}

/// Create a directory and all missing parents, panicking with the offending
/// path on failure.
#[macro_export]
macro_rules! mkdir {
    ( $dir:expr ) => {
        std::fs::create_dir_all(&$dir)
            .unwrap_or_else(|err| {
                panic!("mkdir: couldn't create {:?}: {}", $dir, err)
            })
    }
}

/// Write a series of named arrays to a `.npz` archive.
///
/// Expected form:
/// ```ignore
/// write_npz!(
///     path,
///     arrays: { "name0" => &arr0, "name1" => &arr1, ... }
/// );
/// ```
#[macro_export]
macro_rules! write_npz {
    (
        $path:expr,
        arrays: { $( $name:literal => $arr:expr ),+ $(,)? } $(,)?
    ) => {
        {
            let mut npz
                = ndarray_npy::NpzWriter::new(
                    std::fs::File::create(&$path)
                        .unwrap_or_else(|err| {
                            panic!("write_npz: couldn't create {:?}: {}",
                                $path, err)
                        })
                );
            $(
                npz.add_array($name, $arr)
                    .unwrap_or_else(|err| {
                        panic!("write_npz: couldn't write array {:?}: {}",
                            $name, err)
                    });
            )+
            npz.finish()
                .unwrap_or_else(|err| {
                    panic!("write_npz: couldn't finish {:?}: {}", $path, err)
                });
        }
    }
}

/// NaN-aware extrema for float arrays.
///
/// NaN elements are skipped; `None` is returned only for empty or all-NaN
/// input.
pub trait FExtremum {
    fn fmax(&self) -> Option<f64>;
    fn fmin(&self) -> Option<f64>;
}

impl FExtremum for nd::Array1<f64> {
    fn fmax(&self) -> Option<f64> {
        self.iter().copied()
            .filter(|x| !x.is_nan())
            .fold(None, |acc, x| {
                Some(acc.map_or(x, |a: f64| a.max(x)))
            })
    }

    fn fmin(&self) -> Option<f64> {
        self.iter().copied()
            .filter(|x| !x.is_nan())
            .fold(None, |acc, x| {
                Some(acc.map_or(x, |a: f64| a.min(x)))
            })
    }
}
