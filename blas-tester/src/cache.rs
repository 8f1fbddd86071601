/// 读写一块 `mib` MiB 的缓冲以冲刷 CPU 缓存，使计时不受前一步数据的影响。
///
/// 分配失败只记录警告，计时照常进行。
pub fn flush_cache(mib: usize) {
    if mib == 0 {
        return;
    }
    let Some(len) = mib.checked_mul(1 << 20) else {
        log::warn!("cannot flush {mib} MiB of cache");
        return;
    };
    let mut buf = Vec::<u8>::new();
    if buf.try_reserve_exact(len).is_err() {
        log::warn!("cannot allocate {mib} MiB to flush cache");
        return;
    }
    buf.resize(len, 0);
    for (i, b) in buf.iter_mut().enumerate().step_by(64) {
        *b = i as u8
    }
    let sum = buf.iter().step_by(64).fold(0u8, |acc, &b| acc.wrapping_add(b));
    std::hint::black_box(sum);
    log::trace!("flushed {mib} MiB of cache");
}

#[test]
fn test_flush() {
    flush_cache(0);
    flush_cache(1);
    // 字节数溢出时放弃冲刷
    flush_cache(usize::MAX);
}
