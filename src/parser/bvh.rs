use crate::animation::Frame;
use crate::error::BvhError;
use crate::model::{Channel, Joint, RawClip};
use nalgebra_glm as glm;
use std::str::FromStr;

// Whitespace separated words with their 1-based line numbers
struct Tokens<'a> {
    items: Vec<(usize, &'a str)>,
    pos: usize,
}

impl<'a> Tokens<'a> {
    fn new(content: &'a str) -> Self {
        let items = content
            .lines()
            .enumerate()
            .flat_map(|(i, line)| line.split_whitespace().map(move |w| (i + 1, w)))
            .collect();
        Self { items, pos: 0 }
    }

    fn next(&mut self, expected: &'static str) -> Result<(usize, &'a str), BvhError> {
        let item = self
            .items
            .get(self.pos)
            .copied()
            .ok_or(BvhError::UnexpectedEof { expected })?;
        self.pos += 1;
        Ok(item)
    }

    fn expect(&mut self, word: &'static str) -> Result<usize, BvhError> {
        let (line, found) = self.next(word)?;
        if found != word {
            return Err(BvhError::UnexpectedToken {
                line,
                expected: word,
                found: found.to_string(),
            });
        }
        Ok(line)
    }

    fn number<T: FromStr>(&mut self, expected: &'static str) -> Result<(usize, T), BvhError> {
        let (line, token) = self.next(expected)?;
        token
            .parse()
            .map(|v| (line, v))
            .map_err(|_| BvhError::InvalidNumber {
                line,
                token: token.to_string(),
            })
    }

    fn offset(&mut self) -> Result<[f32; 3], BvhError> {
        self.expect("OFFSET")?;
        let (_, x) = self.number("offset x")?;
        let (_, y) = self.number("offset y")?;
        let (_, z) = self.number("offset z")?;
        Ok([x, y, z])
    }
}

/// Parse a BVH document into joints and frames.
///
/// A zeroed T-pose frame is inserted at index 0, ahead of the frames stored
/// in the file.
pub fn parse_bvh(content: &str) -> Result<RawClip, BvhError> {
    let mut tokens = Tokens::new(content);

    tokens.expect("HIERARCHY")?;
    tokens.expect("ROOT")?;
    let mut joints = Vec::new();
    read_joint(&mut tokens, &mut joints, None)?;

    tokens.expect("MOTION")?;
    tokens.expect("Frames:")?;
    let (_, frame_count) = tokens.number::<usize>("frame count")?;
    tokens.expect("Frame")?;
    tokens.expect("Time:")?;
    let (time_line, time_step) = tokens.number::<f32>("frame time")?;

    let channel_count: usize = joints.iter().map(|j: &Joint| j.channels.len()).sum();

    let mut frames = Vec::with_capacity(frame_count + 1);
    frames.push(Frame::new(
        glm::Vec3::zeros(),
        vec![glm::Vec3::zeros(); joints.len()],
    ));

    let rows = content
        .lines()
        .enumerate()
        .skip(time_line)
        .filter(|(_, row)| !row.trim().is_empty());

    for (frame, (index, row)) in rows.enumerate() {
        let line = index + 1;
        let values = row
            .split_whitespace()
            .map(|token| {
                token.parse::<f32>().map_err(|_| BvhError::InvalidNumber {
                    line,
                    token: token.to_string(),
                })
            })
            .collect::<Result<Vec<f32>, BvhError>>()?;

        if values.len() != channel_count {
            return Err(BvhError::ChannelCountMismatch {
                frame,
                expected: channel_count,
                found: values.len(),
            });
        }
        frames.push(build_frame(&joints, &values));
    }

    let found = frames.len() - 1;
    if found == 0 {
        return Err(BvhError::NoFrames);
    }
    if found != frame_count {
        return Err(BvhError::FrameCountMismatch {
            expected: frame_count,
            found,
        });
    }

    Ok(RawClip {
        joints,
        frames,
        time_step,
    })
}

// Reads the name and body of a ROOT or JOINT block; the keyword is already consumed
fn read_joint(
    tokens: &mut Tokens,
    joints: &mut Vec<Joint>,
    parent: Option<usize>,
) -> Result<(), BvhError> {
    let (_, name) = tokens.next("joint name")?;
    tokens.expect("{")?;
    let offset = tokens.offset()?;

    tokens.expect("CHANNELS")?;
    let (_, count) = tokens.number::<usize>("channel count")?;
    let mut channels = Vec::with_capacity(count);
    for _ in 0..count {
        let (line, channel) = tokens.next("channel name")?;
        let channel = Channel::parse(channel).ok_or_else(|| BvhError::UnknownChannel {
            line,
            name: channel.to_string(),
        })?;
        channels.push(channel);
    }

    let index = joints.len();
    joints.push(Joint {
        name: name.to_string(),
        parent,
        offset,
        channels,
        end_site: None,
    });

    loop {
        let (line, keyword) = tokens.next("JOINT, End Site or }")?;
        match keyword {
            "JOINT" => read_joint(tokens, joints, Some(index))?,
            "End" => {
                tokens.expect("Site")?;
                tokens.expect("{")?;
                joints[index].end_site = Some(tokens.offset()?);
                tokens.expect("}")?;
            }
            "}" => return Ok(()),
            other => {
                return Err(BvhError::UnexpectedToken {
                    line,
                    expected: "JOINT, End Site or }",
                    found: other.to_string(),
                });
            }
        }
    }
}

fn build_frame(joints: &[Joint], values: &[f32]) -> Frame {
    let mut translation = glm::Vec3::zeros();
    let mut rotations = vec![glm::Vec3::zeros(); joints.len()];

    let mut values = values.iter();
    for (index, joint) in joints.iter().enumerate() {
        for channel in &joint.channels {
            let Some(&value) = values.next() else {
                break;
            };
            if channel.is_rotation() {
                rotations[index][channel.axis()] = value;
            } else if joint.is_root() {
                translation[channel.axis()] = value;
            }
        }
    }

    Frame::new(translation, rotations)
}
