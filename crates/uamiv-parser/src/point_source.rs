//! CAMx point-source emissions file.

use bytes::Bytes;
use chrono::NaiveDate;
use std::path::Path;
use tracing::debug;

use crate::records::{Endian, Record, RecordReader, RecordWriter, NAME_WORDS};
use crate::{UamivError, UamivResult};

/// Words in the file note field.
const NOTE_WORDS: usize = 60;

/// Bytes per stack in the stack parameter record (6 reals).
const STACK_BYTES: usize = 24;

/// Bytes per stack in a time step's dynamic record (3 ints, 2 reals).
const STATE_BYTES: usize = 20;

/// File header (record 1).
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    /// File type name, "PTSOURCE" for point-source files
    pub name: String,
    pub note: String,
    /// Begin date as YYJJJ (or YYYYJJJ)
    pub begin_date: i32,
    /// Begin hour (HHMM-style real, e.g. 0.0)
    pub begin_hour: f32,
    pub end_date: i32,
    pub end_hour: f32,
}

impl Header {
    pub fn begin(&self) -> Option<NaiveDate> {
        julian_to_date(self.begin_date)
    }

    pub fn end(&self) -> Option<NaiveDate> {
        julian_to_date(self.end_date)
    }
}

/// Region description (record 2).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Region {
    pub plon: f32,
    pub plat: f32,
    pub iutm: i32,
    pub xorg: f32,
    pub yorg: f32,
    pub delx: f32,
    pub dely: f32,
    pub nx: i32,
    pub ny: i32,
    pub nz: i32,
    pub iproj: i32,
    pub istag: i32,
    pub tlat1: f32,
    pub tlat2: f32,
    pub rdum: f32,
}

/// Static stack parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Stack {
    /// Projected x (meters)
    pub x: f32,
    /// Projected y (meters)
    pub y: f32,
    pub height: f32,
    pub diameter: f32,
    pub temperature: f32,
    pub velocity: f32,
}

/// Per-hour stack state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StackState {
    pub icell: i32,
    pub jcell: i32,
    /// Negative values flag the stack for source tagging
    pub kcell: i32,
    pub flow: f32,
    pub plume_height: f32,
}

/// One time step of emissions.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeStep {
    pub begin_date: i32,
    pub begin_hour: f32,
    pub end_date: i32,
    pub end_hour: f32,
    /// One entry per stack
    pub states: Vec<StackState>,
    /// `[species][stack]` emission rates (mol/h for gases)
    pub emissions: Vec<Vec<f32>>,
}

/// A decoded CAMx point-source file.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSourceFile {
    pub header: Header,
    pub region: Region,
    pub species: Vec<String>,
    pub stacks: Vec<Stack>,
    pub time_steps: Vec<TimeStep>,
}

impl PointSourceFile {
    /// Read and decode a point-source file from disk.
    pub fn open(path: impl AsRef<Path>) -> UamivResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        debug!(path = %path.display(), bytes = data.len(), "Read point-source file");
        Self::from_bytes(&data)
    }

    /// Decode a point-source file from memory.
    pub fn from_bytes(data: &[u8]) -> UamivResult<Self> {
        let mut reader = RecordReader::new(data)?;

        let mut rec = reader.next_record()?;
        let name = rec.name(NAME_WORDS)?;
        let note = rec.name(NOTE_WORDS)?;
        let _ione = rec.i32()?;
        let nspec = count("nspec", rec.i32()?)?;
        let header = Header {
            name,
            note,
            begin_date: rec.i32()?,
            begin_hour: rec.f32()?,
            end_date: rec.i32()?,
            end_hour: rec.f32()?,
        };

        let region = read_region(&mut reader.next_record()?)?;

        // Segment record carries no information beyond the region
        reader.next_record()?;

        let mut rec = reader.next_record()?;
        rec.ensure_items(nspec, NAME_WORDS * 4)?;
        let species = (0..nspec)
            .map(|_| rec.name(NAME_WORDS))
            .collect::<UamivResult<Vec<_>>>()?;

        let mut rec = reader.next_record()?;
        let _ione = rec.i32()?;
        let nstk = count("nstk", rec.i32()?)?;

        let mut rec = reader.next_record()?;
        rec.ensure_items(nstk, STACK_BYTES)?;
        let mut stacks = Vec::with_capacity(nstk);
        for _ in 0..nstk {
            stacks.push(Stack {
                x: rec.f32()?,
                y: rec.f32()?,
                height: rec.f32()?,
                diameter: rec.f32()?,
                temperature: rec.f32()?,
                velocity: rec.f32()?,
            });
        }

        let mut time_steps = Vec::new();
        while !reader.is_at_end() {
            time_steps.push(read_time_step(&mut reader, &species, nstk)?);
        }

        debug!(
            endian = ?reader.endian(),
            species = species.len(),
            stacks = stacks.len(),
            time_steps = time_steps.len(),
            "Decoded point-source file"
        );

        Ok(Self {
            header,
            region,
            species,
            stacks,
            time_steps,
        })
    }

    /// Encode into a Fortran sequential buffer.
    pub fn encode(&self, endian: Endian) -> UamivResult<Bytes> {
        self.check_consistency()?;

        let mut w = RecordWriter::new(endian);
        w.name(&self.header.name, NAME_WORDS)
            .name(&self.header.note, NOTE_WORDS)
            .i32(1)
            .i32(self.species.len() as i32)
            .i32(self.header.begin_date)
            .f32(self.header.begin_hour)
            .i32(self.header.end_date)
            .f32(self.header.end_hour)
            .end_record();

        let r = &self.region;
        w.f32(r.plon)
            .f32(r.plat)
            .i32(r.iutm)
            .f32(r.xorg)
            .f32(r.yorg)
            .f32(r.delx)
            .f32(r.dely)
            .i32(r.nx)
            .i32(r.ny)
            .i32(r.nz)
            .i32(r.iproj)
            .i32(r.istag)
            .f32(r.tlat1)
            .f32(r.tlat2)
            .f32(r.rdum)
            .end_record();

        w.i32(1).i32(1).i32(r.nx).i32(r.ny).end_record();

        for name in &self.species {
            w.name(name, NAME_WORDS);
        }
        w.end_record();

        let nstk = self.stacks.len() as i32;
        w.i32(1).i32(nstk).end_record();

        for s in &self.stacks {
            w.f32(s.x)
                .f32(s.y)
                .f32(s.height)
                .f32(s.diameter)
                .f32(s.temperature)
                .f32(s.velocity);
        }
        w.end_record();

        for step in &self.time_steps {
            w.i32(step.begin_date)
                .f32(step.begin_hour)
                .i32(step.end_date)
                .f32(step.end_hour)
                .end_record();
            w.i32(1).i32(nstk).end_record();
            for st in &step.states {
                w.i32(st.icell)
                    .i32(st.jcell)
                    .i32(st.kcell)
                    .f32(st.flow)
                    .f32(st.plume_height);
            }
            w.end_record();
            for (name, rates) in self.species.iter().zip(&step.emissions) {
                w.i32(1).name(name, NAME_WORDS);
                for &rate in rates {
                    w.f32(rate);
                }
                w.end_record();
            }
        }

        Ok(w.finish())
    }

    /// Encode and write to disk.
    pub fn write(&self, path: impl AsRef<Path>, endian: Endian) -> UamivResult<()> {
        let bytes = self.encode(endian)?;
        std::fs::write(path, &bytes)?;
        Ok(())
    }

    fn check_consistency(&self) -> UamivResult<()> {
        let nstk = self.stacks.len();
        for (t, step) in self.time_steps.iter().enumerate() {
            if step.states.len() != nstk {
                return Err(UamivError::InvalidFormat(format!(
                    "time step {} has {} stack states, expected {}",
                    t,
                    step.states.len(),
                    nstk
                )));
            }
            if step.emissions.len() != self.species.len() {
                return Err(UamivError::InvalidFormat(format!(
                    "time step {} has {} species, expected {}",
                    t,
                    step.emissions.len(),
                    self.species.len()
                )));
            }
            if let Some(rates) = step.emissions.iter().find(|r| r.len() != nstk) {
                return Err(UamivError::InvalidFormat(format!(
                    "time step {} has {} emission rates, expected {}",
                    t,
                    rates.len(),
                    nstk
                )));
            }
        }
        Ok(())
    }

    /// Number of stacks.
    pub fn num_stacks(&self) -> usize {
        self.stacks.len()
    }

    /// Position of a species by name (case-insensitive).
    pub fn species_index(&self, name: &str) -> Option<usize> {
        self.species
            .iter()
            .position(|s| s.eq_ignore_ascii_case(name))
    }

    /// Emission rates of one species as `[time][stack]`.
    pub fn species_series(&self, name: &str) -> UamivResult<Vec<&[f32]>> {
        let idx = self
            .species_index(name)
            .ok_or_else(|| UamivError::UnknownSpecies(name.to_string()))?;
        self.time_steps
            .iter()
            .enumerate()
            .map(|(t, step)| {
                step.emissions.get(idx).map(Vec::as_slice).ok_or_else(|| {
                    UamivError::InvalidFormat(format!("time step {} is missing species {}", t, name))
                })
            })
            .collect()
    }
}

fn count(field: &str, value: i32) -> UamivResult<usize> {
    usize::try_from(value)
        .map_err(|_| UamivError::InvalidFormat(format!("negative {}: {}", field, value)))
}

fn read_region(rec: &mut Record<'_>) -> UamivResult<Region> {
    Ok(Region {
        plon: rec.f32()?,
        plat: rec.f32()?,
        iutm: rec.i32()?,
        xorg: rec.f32()?,
        yorg: rec.f32()?,
        delx: rec.f32()?,
        dely: rec.f32()?,
        nx: rec.i32()?,
        ny: rec.i32()?,
        nz: rec.i32()?,
        iproj: rec.i32()?,
        istag: rec.i32()?,
        tlat1: rec.f32()?,
        tlat2: rec.f32()?,
        rdum: rec.f32()?,
    })
}

fn read_time_step(
    reader: &mut RecordReader<'_>,
    species: &[String],
    nstk: usize,
) -> UamivResult<TimeStep> {
    let mut rec = reader.next_record()?;
    let begin_date = rec.i32()?;
    let begin_hour = rec.f32()?;
    let end_date = rec.i32()?;
    let end_hour = rec.f32()?;

    let mut rec = reader.next_record()?;
    let _ione = rec.i32()?;
    let step_nstk = rec.i32()?;
    if step_nstk as i64 != nstk as i64 {
        return Err(UamivError::InvalidFormat(format!(
            "time step at record {} declares {} stacks, header declares {}",
            rec.index(),
            step_nstk,
            nstk
        )));
    }

    let mut rec = reader.next_record()?;
    rec.ensure_items(nstk, STATE_BYTES)?;
    let mut states = Vec::with_capacity(nstk);
    for _ in 0..nstk {
        states.push(StackState {
            icell: rec.i32()?,
            jcell: rec.i32()?,
            kcell: rec.i32()?,
            flow: rec.f32()?,
            plume_height: rec.f32()?,
        });
    }

    let mut emissions = Vec::with_capacity(species.len());
    for expected in species {
        let mut rec = reader.next_record()?;
        let _ione = rec.i32()?;
        let name = rec.name(NAME_WORDS)?;
        if !name.eq_ignore_ascii_case(expected) {
            return Err(UamivError::InvalidFormat(format!(
                "record {} holds species '{}', expected '{}'",
                rec.index(),
                name,
                expected
            )));
        }
        emissions.push(rec.f32_vec(nstk)?);
    }

    Ok(TimeStep {
        begin_date,
        begin_hour,
        end_date,
        end_hour,
        states,
        emissions,
    })
}

/// Convert a CAMx Julian date (YYJJJ or YYYYJJJ) to a calendar date.
///
/// Two-digit years below 70 are taken as 20xx.
pub fn julian_to_date(julian: i32) -> Option<NaiveDate> {
    if julian <= 0 {
        return None;
    }
    let day = (julian % 1000) as u32;
    let year = julian / 1000;
    let year = match year {
        0..=69 => 2000 + year,
        70..=99 => 1900 + year,
        _ => year,
    };
    NaiveDate::from_yo_opt(year, day)
}
