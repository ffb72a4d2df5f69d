use std::io::{self, Read, Write};

use super::network::{Group, Network};
use super::CodecError;

// Float checkpoint, lossless for training:
// magic: 8 bytes b"EVNCKPT1"
// u32 version (LE)
// 5 x (u32 input_dim, u32 output_dim), in group order
// per group: f32 weight[output_dim * input_dim], f32 bias[output_dim]
pub const CKPT_MAGIC: &[u8; 8] = b"EVNCKPT1";
pub const CKPT_VERSION: u32 = 1;

pub fn write_checkpoint<W: Write>(net: &Network, w: &mut W) -> Result<(), CodecError> {
    w.write_all(CKPT_MAGIC)?;
    w.write_all(&CKPT_VERSION.to_le_bytes())?;
    for g in Group::ALL {
        let l = net.layer(g);
        w.write_all(&(l.input_dim as u32).to_le_bytes())?;
        w.write_all(&(l.output_dim as u32).to_le_bytes())?;
    }
    let mut buf = Vec::new();
    for g in Group::ALL {
        let l = net.layer(g);
        buf.clear();
        buf.reserve((l.weight.len() + l.bias.len()) * 4);
        for v in l.weight.iter().chain(&l.bias) { buf.extend_from_slice(&v.to_le_bytes()); }
        w.write_all(&buf)?;
    }
    w.flush()?;
    Ok(())
}

pub fn read_checkpoint<R: Read>(r: &mut R) -> Result<Network, CodecError> {
    let mut magic = [0u8; 8];
    read_exact(r, &mut magic, "checkpoint magic")?;
    if &magic != CKPT_MAGIC { return Err(CodecError::BadMagic); }
    let version = read_u32(r, "checkpoint version")?;
    if version != CKPT_VERSION { return Err(CodecError::UnsupportedVersion { found: version }); }
    for g in Group::ALL {
        let found = (read_u32(r, "checkpoint shape")? as usize, read_u32(r, "checkpoint shape")? as usize);
        if found != g.shape() {
            return Err(CodecError::ShapeMismatch { group: g.name(), expected: g.shape(), found });
        }
    }
    let mut net = Network::zeros();
    for g in Group::ALL {
        let l = net.layer_mut(g);
        read_f32s(r, &mut l.weight, g.name())?;
        read_f32s(r, &mut l.bias, g.name())?;
    }
    Ok(net)
}

fn read_exact<R: Read>(r: &mut R, buf: &mut [u8], block: &'static str) -> Result<(), CodecError> {
    let mut off = 0usize;
    while off < buf.len() {
        match r.read(&mut buf[off..]) {
            Ok(0) => return Err(CodecError::Truncated { block, needed: buf.len(), remaining: off }),
            Ok(k) => off += k,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn read_u32<R: Read>(r: &mut R, block: &'static str) -> Result<u32, CodecError> {
    let mut b4 = [0u8; 4];
    read_exact(r, &mut b4, block)?;
    Ok(u32::from_le_bytes(b4))
}

fn read_f32s<R: Read>(r: &mut R, dst: &mut [f32], block: &'static str) -> Result<(), CodecError> {
    let mut buf = vec![0u8; dst.len() * 4];
    read_exact(r, &mut buf, block)?;
    for (d, c) in dst.iter_mut().zip(buf.chunks_exact(4)) {
        *d = f32::from_le_bytes([c[0], c[1], c[2], c[3]]);
    }
    Ok(())
}
