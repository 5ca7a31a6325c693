use crate::error::PipelineError;

/// Orders `items` back to front: largest `key` first.
///
/// Keys are evaluated once up front. A NaN key aborts before anything moves
/// and reports the index of the offending item. The sort is an in-place
/// quicksort with a middle pivot and is not stable.
pub fn depth_sort<T, F>(items: &mut [T], key: F) -> Result<(), PipelineError>
where
    F: Fn(&T) -> f32,
{
    let mut keys: Vec<f32> = items.iter().map(&key).collect();
    if let Some(index) = keys.iter().position(|k| k.is_nan()) {
        return Err(PipelineError::NanDepth { index });
    }
    if items.len() > 1 {
        let last = items.len() - 1;
        let mut sorter = Sorter {
            keys: &mut keys,
            items,
        };
        sorter.quicksort(0, last);
    }
    Ok(())
}

struct Sorter<'a, T> {
    keys: &'a mut [f32],
    items: &'a mut [T],
}

impl<T> Sorter<'_, T> {
    #[inline]
    fn swap(&mut self, a: usize, b: usize) {
        self.keys.swap(a, b);
        self.items.swap(a, b);
    }

    fn quicksort(&mut self, i: usize, j: usize) {
        let pivot = (i + j) / 2;
        self.swap(pivot, j);
        let k = self.partition(i as isize - 1, j);
        self.swap(k, j);
        if k > i + 1 {
            self.quicksort(i, k - 1);
        }
        if j > k + 1 {
            self.quicksort(k + 1, j);
        }
    }

    /// Moves keys above the pivot (stored at `right`) to the front and
    /// returns the split point.
    fn partition(&mut self, mut left: isize, mut right: usize) -> usize {
        let pivot = self.keys[right];
        let mut l;
        loop {
            left += 1;
            l = left as usize;
            while self.keys[l] > pivot {
                l += 1;
            }
            left = l as isize;

            while right != 0 {
                right -= 1;
                if self.keys[right] >= pivot {
                    break;
                }
            }

            self.swap(l, right);
            if l >= right {
                break;
            }
        }
        // the last swap crossed over
        self.swap(l, right);
        l
    }
}
