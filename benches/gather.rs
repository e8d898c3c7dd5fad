use rand::{rngs::StdRng, Rng, SeedableRng};
use std::hint::black_box;
use std::time::{Duration, Instant};
use strided_gather::reference::as_strided_naive;
use strided_gather::{as_strided_into, plan_as_strided, DeviceConfig, Element};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn median(samples: &mut [Duration]) -> Duration {
    samples.sort();
    let n = samples.len();
    if n % 2 == 1 {
        samples[n / 2]
    } else {
        (samples[n / 2 - 1] + samples[n / 2]) / 2
    }
}

fn bench_n(label: &str, warmup: usize, iters: usize, bytes: usize, mut f: impl FnMut()) {
    for _ in 0..warmup {
        f();
    }
    let mut samples = Vec::with_capacity(iters);
    for _ in 0..iters {
        let t0 = Instant::now();
        f();
        samples.push(t0.elapsed());
    }
    let med = median(&mut samples);
    let ms = med.as_secs_f64() * 1e3;
    let gbps = (bytes as f64) / med.as_secs_f64() / 1e9;
    let p25 = samples[samples.len() / 4].as_secs_f64() * 1e3;
    let p75 = samples[samples.len() * 3 / 4].as_secs_f64() * 1e3;
    println!("  {label:36} {ms:8.3} ms  ({p25:.3} / {p75:.3})  {gbps:6.2} GB/s");
}

fn random_src<T: Element>(len: usize, seed: u64) -> Vec<T> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![T::zeroed(); len];
    rng.fill(bytemuck::cast_slice_mut::<T, u8>(&mut data));
    data
}

fn src_len(size: &[usize], stride: &[isize], offset: isize) -> usize {
    let reach: isize = size
        .iter()
        .zip(stride)
        .map(|(&d, &s)| (d as isize - 1) * s)
        .sum();
    (offset + reach + 1) as usize
}

/// Engine against the scalar reference on one view.
fn bench_view<T: Element>(name: &str, size: &[usize], stride: &[isize], cfg: &DeviceConfig) {
    let src = random_src::<T>(src_len(size, stride, 0), 42);
    let total: usize = size.iter().product();
    let bytes = 2 * total * std::mem::size_of::<T>();
    let mode = match plan_as_strided::<T>(src.len(), size, stride, 0, cfg) {
        Ok(Some(plan)) => plan.mode.to_string(),
        Ok(None) => "empty".to_string(),
        Err(e) => {
            println!("  {name}: {e}");
            return;
        }
    };
    println!("{name} [{mode}]");

    let mut dst = vec![T::zeroed(); total];
    bench_n("engine", 2, 10, bytes, || {
        as_strided_into(&mut dst, &src, size, stride, 0, cfg).unwrap();
        black_box(&dst);
    });
    bench_n("reference", 1, 5, bytes, || {
        black_box(as_strided_naive(&src, size, stride, 0));
    });
}

fn main() {
    let cfg = DeviceConfig::default();
    println!("as_strided gather (median of samples, p25 / p75)");

    bench_view::<f32>("contiguous rows 4096x1000", &[4096, 1000], &[1024, 1], &cfg);
    bench_view::<f32>("transpose 1024x4", &[1024, 4], &[1, 1024], &cfg);
    bench_view::<f32>("transpose 16384x8", &[16384, 8], &[1, 16384], &cfg);
    bench_view::<f32>("stride 3, 2048x600", &[2048, 600], &[2000, 3], &cfg);
    bench_view::<f32>("small last dim 20000x7", &[20000, 7], &[50, 3], &cfg);
    bench_view::<f32>("large stride 64x2000", &[64, 2000], &[1, 40], &cfg);
    bench_view::<f32>("broadcast 2048x512", &[2048, 512], &[1, 0], &cfg);
    bench_view::<u8>("u8 stride 5, 4096x500", &[4096, 500], &[3000, 5], &cfg);
    bench_view::<f64>("f64 resident 100000x7", &[100_000, 7], &[90, 40], &cfg);
}
